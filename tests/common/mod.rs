//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use payflow::{
    Account, AccountType, Balance, DeliveryError, EligibilityPolicy, InMemoryStore,
    NotificationGateway, TransferEngine, TransferNotice,
};

pub fn regular_account(document: &str, email: &str, name: &str, balance: Decimal) -> Account {
    Account::new(
        Uuid::new_v4(),
        document,
        email,
        name,
        Balance::new(balance).expect("valid balance"),
        AccountType::Regular,
    )
}

pub fn merchant_account(document: &str, email: &str, name: &str, balance: Decimal) -> Account {
    Account::new(
        Uuid::new_v4(),
        document,
        email,
        name,
        Balance::new(balance).expect("valid balance"),
        AccountType::Merchant,
    )
}

/// Notifier that reports every delivery over a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<(String, TransferNotice)>,
}

impl RecordingNotifier {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, TransferNotice)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn notify(
        &self,
        recipient_email: &str,
        notice: &TransferNotice,
    ) -> Result<(), DeliveryError> {
        let _ = self.tx.send((recipient_email.to_string(), notice.clone()));
        Ok(())
    }
}

/// Notifier whose deliveries always fail, still reporting each attempt.
pub struct FailingNotifier {
    tx: mpsc::UnboundedSender<String>,
}

impl FailingNotifier {
    pub fn channel() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl NotificationGateway for FailingNotifier {
    async fn notify(
        &self,
        recipient_email: &str,
        _notice: &TransferNotice,
    ) -> Result<(), DeliveryError> {
        let _ = self.tx.send(recipient_email.to_string());
        Err(DeliveryError("smtp relay down".to_string()))
    }
}

/// Engine over the given store with the default policy and a notifier.
pub fn engine(store: &Arc<InMemoryStore>, notifier: Arc<dyn NotificationGateway>) -> TransferEngine {
    TransferEngine::new(
        store.clone(),
        store.clone(),
        EligibilityPolicy::new(),
        notifier,
    )
}

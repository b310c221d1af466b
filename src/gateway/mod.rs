//! External gateways
//!
//! Notification and authorization providers live behind these traits. Both
//! are best-effort collaborators from the transfer core's point of view:
//! notification failures never fail a transfer, and an unreachable
//! authorizer falls back to the policy's configured mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Amount;

/// What the payee gets told about a received transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferNotice {
    pub record_id: Uuid,
    pub value: Amount,
    pub payer_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct DeliveryError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("authorization gateway unavailable: {0}")]
pub struct AuthorizationError(pub String);

/// Best-effort delivery of a transfer notice to the payee.
///
/// At most one attempt per committed transfer; the caller logs failures and
/// never retries here.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(&self, recipient_email: &str, notice: &TransferNotice)
        -> Result<(), DeliveryError>;
}

/// Optional external authorization decision for a transfer.
#[async_trait]
pub trait AuthorizationGateway: Send + Sync {
    async fn authorize(&self, payer_id: Uuid, value: Decimal) -> Result<bool, AuthorizationError>;
}

/// Notifier that records deliveries in the structured log.
///
/// Stands in wherever no real provider is wired up, keeping the notification
/// path observable.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationGateway for LoggingNotifier {
    async fn notify(
        &self,
        recipient_email: &str,
        notice: &TransferNotice,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string(notice).map_err(|e| DeliveryError(e.to_string()))?;
        tracing::info!(recipient = recipient_email, %payload, "transfer notice");
        Ok(())
    }
}

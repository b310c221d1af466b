//! Transfer engine
//!
//! Orchestrates one transfer: payee resolution, eligibility, the atomic
//! debit/credit/record commit, and the post-commit notification. All
//! transfer-path failures abort with zero persisted side effects; the commit
//! itself is all-or-nothing by the store contract.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::domain::{
    Account, Participant, TransactionRecord, TransactionResult, TransferRequest,
};
use crate::error::TransferError;
use crate::gateway::{AuthorizationGateway, NotificationGateway, TransferNotice};
use crate::policy::EligibilityPolicy;
use crate::store::{AccountStore, BalanceUpdate, StoreError, TransactionStore, TransferCommit};

/// Default number of commit attempts before giving up on conflicts.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit between conflicting attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// The transfer orchestrator.
pub struct TransferEngine {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
    policy: EligibilityPolicy,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl TransferEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        policy: EligibilityPolicy,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            policy,
            notifier,
            clock: Arc::new(SystemClock),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Engine wired from environment-sourced settings: the authorization
    /// toggles reach the policy and `MAX_COMMIT_ATTEMPTS` sets the attempt
    /// budget.
    pub fn from_config(
        config: &Config,
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
        authorization: Option<Arc<dyn AuthorizationGateway>>,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        let policy = EligibilityPolicy::from_config(config, authorization);
        Self::new(accounts, transactions, policy, notifier)
            .with_max_attempts(config.max_commit_attempts)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Total commit attempts per transfer (validation re-runs each time).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Move `request.value` from `payer` to the account resolved from
    /// `request.payee`.
    ///
    /// The caller hands in an already-resolved, authenticated payer. On a
    /// commit conflict the whole validation sequence re-runs against freshly
    /// loaded state, never just the write step.
    pub async fn transfer(
        &self,
        payer: &Account,
        request: TransferRequest,
    ) -> Result<TransactionResult, TransferError> {
        let mut payer_state = payer.clone();

        for attempt in 0..self.max_attempts {
            match self.try_transfer(&payer_state, &request).await {
                Ok(result) => return Ok(result),
                Err(TransferError::Store(err)) if err.is_retryable() => {
                    if attempt + 1 == self.max_attempts {
                        tracing::warn!(
                            payer = %payer.id(),
                            attempts = self.max_attempts,
                            "transfer commit kept conflicting, giving up"
                        );
                        return Err(TransferError::PersistenceConflict);
                    }

                    tracing::warn!(
                        payer = %payer.id(),
                        attempt = attempt + 1,
                        error = %err,
                        "transfer commit conflicted, revalidating"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * (attempt + 1)).await;

                    payer_state = self
                        .accounts
                        .get(payer.id())
                        .await?
                        .ok_or(StoreError::AccountMissing(payer.id()))?;
                }
                Err(err) => return Err(err),
            }
        }

        Err(TransferError::PersistenceConflict)
    }

    /// One full validate-and-commit attempt.
    async fn try_transfer(
        &self,
        payer: &Account,
        request: &TransferRequest,
    ) -> Result<TransactionResult, TransferError> {
        let payee = self
            .accounts
            .find_by_key(&request.payee)
            .await?
            .ok_or_else(|| TransferError::PayeeNotFound(request.payee.to_string()))?;

        if payee.id() == payer.id() {
            return Err(TransferError::SameParticipant);
        }

        self.policy.check(payer, &request.value).await?;

        // successor states; the debit re-checks the balance against the
        // state this attempt actually read
        let payer_next = payer.debited(&request.value)?;
        let payee_next = payee.credited(&request.value)?;

        let record = TransactionRecord::new(
            payer.id(),
            payee.id(),
            request.value.clone(),
            self.clock.now(),
        );

        let commit = TransferCommit {
            debit: BalanceUpdate::from_states(payer, &payer_next),
            credit: BalanceUpdate::from_states(&payee, &payee_next),
            record: record.clone(),
        };

        self.transactions.commit_transfer(commit).await?;

        tracing::info!(
            record = %record.id,
            payer = %payer.id(),
            payee = %payee.id(),
            value = %record.value,
            "transfer committed"
        );

        self.dispatch_notice(&payee, &record, payer.full_name().to_string());

        Ok(TransactionResult {
            record_id: record.id,
            value: record.value,
            payer: Participant::from(payer),
            payee: Participant::from(&payee),
            timestamp: record.timestamp,
        })
    }

    /// Fire-and-forget payee notification. One attempt; a failed delivery is
    /// logged and must never fail the committed transfer.
    fn dispatch_notice(&self, payee: &Account, record: &TransactionRecord, payer_name: String) {
        let notice = TransferNotice {
            record_id: record.id,
            value: record.value.clone(),
            payer_name,
            timestamp: record.timestamp,
        };
        let recipient = payee.email().to_string();
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            if let Err(err) = notifier.notify(&recipient, &notice).await {
                tracing::warn!(
                    recipient = %recipient,
                    record = %notice.record_id,
                    error = %err,
                    "transfer notification failed"
                );
            }
        });
    }
}

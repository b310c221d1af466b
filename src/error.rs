//! Error taxonomy for the transfer and query paths
//!
//! Every transfer-path error aborts the whole operation with zero persisted
//! side effects. Notification delivery errors are deliberately absent here:
//! they are logged by the engine and never surfaced as transfer failures.

use uuid::Uuid;

use crate::domain::AmountError;
use crate::store::StoreError;

/// Why an eligibility check turned a transfer down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotEligibleReason {
    #[error("account type may not originate transfers")]
    AccountTypeForbidden,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("external authorization denied")]
    AuthorizationDenied,
}

/// Errors surfaced by [`TransferEngine::transfer`](crate::engine::TransferEngine::transfer).
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// No account matches the supplied document-or-email key.
    #[error("payee not found: {0}")]
    PayeeNotFound(String),

    /// Payer and payee resolve to the same account.
    #[error("transfer to the same account is not allowed")]
    SameParticipant,

    /// The payer failed an eligibility check. A commit-time balance race
    /// surfaces as `InsufficientBalance` here as well, indistinguishable
    /// from the policy-time check.
    #[error("transfer not eligible: {0}")]
    NotEligible(NotEligibleReason),

    /// The atomic commit kept conflicting with concurrent writes and the
    /// bounded retries ran out.
    #[error("transfer could not be committed after repeated conflicts")]
    PersistenceConflict,

    /// Invalid monetary value (overflow of the balance cap and the like).
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Store failure outside the conflict path.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TransferError {
    pub fn insufficient_balance() -> Self {
        TransferError::NotEligible(NotEligibleReason::InsufficientBalance)
    }

    /// True for the definitive rejections a caller should not retry.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TransferError::PayeeNotFound(_)
                | TransferError::SameParticipant
                | TransferError::NotEligible(_)
        )
    }
}

/// Errors surfaced by the read-only query operations.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored record references an account the store no longer returns.
    #[error("unknown participant referenced by record: {0}")]
    UnknownParticipant(Uuid),
}

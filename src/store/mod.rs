//! Persistence interfaces
//!
//! The core consumes two narrow store traits. Balance mutation never happens
//! as load-modify-save: the engine computes successor states and hands the
//! store a [`TransferCommit`] whose balance updates are compare-and-set
//! against the account versions it read. A store either applies all three
//! writes (two balances, one record) or none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Account, AccountKey, Balance, ParticipantRole, TransactionRecord};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed: the account changed between the
    /// engine's read and the commit.
    #[error("version conflict on account {account_id}: expected {expected}, found {actual}")]
    VersionConflict {
        account_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// A commit referenced an account the store does not hold.
    #[error("account missing from store: {0}")]
    AccountMissing(Uuid),

    /// The store could not complete the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data failed to map back into domain types.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Conflicts are worth retrying with re-validation; the rest are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Compare-and-set update of one account's balance.
///
/// Applies only if the stored version still equals `expected_version`; the
/// committed version becomes `expected_version + 1`.
#[derive(Debug, Clone)]
pub struct BalanceUpdate {
    pub account_id: Uuid,
    pub expected_version: i64,
    pub new_balance: Balance,
}

impl BalanceUpdate {
    /// Update that moves `current` to the already-validated `next` state.
    pub fn from_states(current: &Account, next: &Account) -> Self {
        Self {
            account_id: current.id(),
            expected_version: current.version(),
            new_balance: next.balance().clone(),
        }
    }
}

/// The atomic unit of a transfer: debit, credit and record, all or nothing.
#[derive(Debug, Clone)]
pub struct TransferCommit {
    pub debit: BalanceUpdate,
    pub credit: BalanceUpdate,
    pub record: TransactionRecord,
}

/// Read access to accounts.
///
/// Accounts are created elsewhere; this core only resolves and reads them.
/// Balance writes go exclusively through [`TransactionStore::commit_transfer`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Resolve the ambiguous document-or-email key.
    ///
    /// Resolution order is fixed: an exact document match wins over an email
    /// match.
    async fn find_by_key(&self, key: &AccountKey) -> Result<Option<Account>, StoreError>;
}

/// Transaction records plus the atomic transfer commit.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Apply both balance updates and persist the record in one atomic unit.
    ///
    /// Fails with [`StoreError::VersionConflict`] when either account moved
    /// past its expected version; in that case nothing is persisted.
    async fn commit_transfer(&self, commit: TransferCommit) -> Result<(), StoreError>;

    /// Records where `participant` appears in the given role, with
    /// `timestamp` within `[start, end]` (both inclusive), ascending by
    /// timestamp.
    async fn find_by_participant(
        &self,
        participant: Uuid,
        role: ParticipantRole,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, StoreError>;
}

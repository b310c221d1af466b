//! In-memory store
//!
//! Reference adapter used by tests and local wiring. A single mutex over the
//! whole state makes the version checks and the three writes of a commit one
//! indivisible step, which is exactly the atomicity contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Account, AccountKey, ParticipantRole, TransactionRecord};

use super::{AccountStore, BalanceUpdate, StoreError, TransactionStore, TransferCommit};

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    records: Vec<TransactionRecord>,
}

/// Mutex-backed store holding accounts and transaction records.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    // commits to reject before mutating anything; lets tests prove that a
    // failed record write leaves both balances untouched
    failing_commits: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Replaces any previous state under the same id.
    pub async fn insert_account(&self, account: Account) {
        let mut state = self.state.lock().await;
        state.accounts.insert(account.id(), account);
    }

    /// Make the next `n` commits fail with `StoreError::Unavailable` before
    /// any write is applied.
    pub fn fail_next_commits(&self, n: u32) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Current state of an account, if present.
    pub async fn account(&self, id: Uuid) -> Option<Account> {
        self.state.lock().await.accounts.get(&id).cloned()
    }

    /// All committed records, in commit order.
    pub async fn records(&self) -> Vec<TransactionRecord> {
        self.state.lock().await.records.clone()
    }

    fn apply_update(state: &mut State, update: &BalanceUpdate) -> Result<(), StoreError> {
        let account = state
            .accounts
            .get(&update.account_id)
            .ok_or(StoreError::AccountMissing(update.account_id))?;

        if account.version() != update.expected_version {
            return Err(StoreError::VersionConflict {
                account_id: update.account_id,
                expected: update.expected_version,
                actual: account.version(),
            });
        }

        let next = Account::from_stored(
            account.id(),
            account.document().to_string(),
            account.email().to_string(),
            account.full_name().to_string(),
            update.new_balance.clone(),
            account.account_type(),
            update.expected_version + 1,
        );
        state.accounts.insert(update.account_id, next);
        Ok(())
    }

    fn check_update(state: &State, update: &BalanceUpdate) -> Result<(), StoreError> {
        let account = state
            .accounts
            .get(&update.account_id)
            .ok_or(StoreError::AccountMissing(update.account_id))?;

        if account.version() != update.expected_version {
            return Err(StoreError::VersionConflict {
                account_id: update.account_id,
                expected: update.expected_version,
                actual: account.version(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &AccountKey) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;

        let by_document = state
            .accounts
            .values()
            .find(|a| a.document() == key.as_str());
        if let Some(account) = by_document {
            return Ok(Some(account.clone()));
        }

        Ok(state
            .accounts
            .values()
            .find(|a| a.email() == key.as_str())
            .cloned())
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn commit_transfer(&self, commit: TransferCommit) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        // validate both sides before touching anything, so a conflict on the
        // second account cannot leave the first one half-applied
        Self::check_update(&state, &commit.debit)?;
        Self::check_update(&state, &commit.credit)?;

        if self
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        Self::apply_update(&mut state, &commit.debit)?;
        Self::apply_update(&mut state, &commit.credit)?;
        state.records.push(commit.record);
        Ok(())
    }

    async fn find_by_participant(
        &self,
        participant: Uuid,
        role: ParticipantRole,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let state = self.state.lock().await;

        let mut matches: Vec<TransactionRecord> = state
            .records
            .iter()
            .filter(|r| match role {
                ParticipantRole::Payer => r.payer_id == participant,
                ParticipantRole::Payee => r.payee_id == participant,
                ParticipantRole::Either => {
                    r.payer_id == participant || r.payee_id == participant
                }
            })
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .cloned()
            .collect();

        matches.sort_by_key(|r| r.timestamp);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, Amount, Balance};
    use rust_decimal_macros::dec;

    fn account(document: &str, email: &str, balance: rust_decimal::Decimal) -> Account {
        Account::new(
            Uuid::new_v4(),
            document,
            email,
            "Someone",
            Balance::new(balance).unwrap(),
            AccountType::Regular,
        )
    }

    fn commit_between(payer: &Account, payee: &Account, value: rust_decimal::Decimal) -> TransferCommit {
        let amount = Amount::new(value).unwrap();
        let debited = payer.debited(&amount).unwrap();
        let credited = payee.credited(&amount).unwrap();
        TransferCommit {
            debit: BalanceUpdate::from_states(payer, &debited),
            credit: BalanceUpdate::from_states(payee, &credited),
            record: TransactionRecord::new(payer.id(), payee.id(), amount, Utc::now()),
        }
    }

    #[tokio::test]
    async fn document_match_wins_over_email_match() {
        let store = InMemoryStore::new();
        // one account's document equals another account's email
        let by_document = account("shared-key", "first@example.com", dec!(0));
        let by_email = account("11122233344", "shared-key", dec!(0));
        let document_id = by_document.id();

        store.insert_account(by_email).await;
        store.insert_account(by_document).await;

        let resolved = store
            .find_by_key(&AccountKey::new("shared-key"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id(), document_id);
    }

    #[tokio::test]
    async fn commit_applies_both_sides_and_record() {
        let store = InMemoryStore::new();
        let payer = account("111", "p@example.com", dec!(100));
        let payee = account("222", "q@example.com", dec!(10));
        store.insert_account(payer.clone()).await;
        store.insert_account(payee.clone()).await;

        store
            .commit_transfer(commit_between(&payer, &payee, dec!(40)))
            .await
            .unwrap();

        assert_eq!(store.account(payer.id()).await.unwrap().balance().value(), dec!(60));
        assert_eq!(store.account(payee.id()).await.unwrap().balance().value(), dec!(50));
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn stale_version_conflicts_and_leaves_state_untouched() {
        let store = InMemoryStore::new();
        let payer = account("111", "p@example.com", dec!(100));
        let payee = account("222", "q@example.com", dec!(10));
        store.insert_account(payer.clone()).await;
        store.insert_account(payee.clone()).await;

        // first commit bumps the payer version
        store
            .commit_transfer(commit_between(&payer, &payee, dec!(10)))
            .await
            .unwrap();

        // second commit still based on the stale payer snapshot
        let result = store
            .commit_transfer(commit_between(&payer, &payee, dec!(10)))
            .await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));

        assert_eq!(store.account(payer.id()).await.unwrap().balance().value(), dec!(90));
        assert_eq!(store.account(payee.id()).await.unwrap().balance().value(), dec!(20));
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn conflict_on_credit_side_does_not_apply_debit() {
        let store = InMemoryStore::new();
        let payer = account("111", "p@example.com", dec!(100));
        let payee = account("222", "q@example.com", dec!(10));
        store.insert_account(payer.clone()).await;
        store.insert_account(payee.clone()).await;

        let mut commit = commit_between(&payer, &payee, dec!(40));
        commit.credit.expected_version = 99;

        let result = store.commit_transfer(commit).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        assert_eq!(store.account(payer.id()).await.unwrap().balance().value(), dec!(100));
    }

    #[tokio::test]
    async fn injected_failure_rejects_commit_before_any_write() {
        let store = InMemoryStore::new();
        let payer = account("111", "p@example.com", dec!(100));
        let payee = account("222", "q@example.com", dec!(10));
        store.insert_account(payer.clone()).await;
        store.insert_account(payee.clone()).await;

        store.fail_next_commits(1);
        let result = store
            .commit_transfer(commit_between(&payer, &payee, dec!(40)))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.account(payer.id()).await.unwrap().balance().value(), dec!(100));
        assert!(store.records().await.is_empty());

        // next commit goes through
        store
            .commit_transfer(commit_between(&payer, &payee, dec!(40)))
            .await
            .unwrap();
        assert_eq!(store.records().await.len(), 1);
    }
}

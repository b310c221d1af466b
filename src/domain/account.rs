//! Account entity
//!
//! Account is the shared mutable resource of the transfer core. Balance
//! changes are computed here as immutable updates and only become visible
//! once a store commit succeeds; the `version` field is the optimistic
//! concurrency token checked by that commit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::TransferError;

use super::{Amount, AmountError, Balance};

/// Account classification. Drives the transfer-origination capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Regular,
    Merchant,
}

impl AccountType {
    /// Whether accounts of this type may originate transfers.
    ///
    /// Eligibility checks go through this capability rather than matching on
    /// the type, so adding a new account type does not touch transfer logic.
    pub fn may_originate_transfers(&self) -> bool {
        matches!(self, AccountType::Regular)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Regular => "regular",
            AccountType::Merchant => "merchant",
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(AccountType::Regular),
            "merchant" => Ok(AccountType::Merchant),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The document-or-email payee lookup key.
///
/// The same caller-supplied string is matched against both fields, so it is
/// reified as one typed key with a fixed resolution order: document first,
/// then email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey(String);

impl AccountKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// An account holder.
///
/// Created and authenticated outside this core; here it is only read and,
/// during a transfer commit, debited or credited. State never mutates in
/// place: `debited`/`credited` return the successor value and the store
/// compare-and-sets it against `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: Uuid,
    document: String,
    email: String,
    full_name: String,
    balance: Balance,
    account_type: AccountType,
    version: i64,
}

impl Account {
    pub fn new(
        id: Uuid,
        document: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
        balance: Balance,
        account_type: AccountType,
    ) -> Self {
        Self {
            id,
            document: document.into(),
            email: email.into(),
            full_name: full_name.into(),
            balance,
            account_type,
            version: 1,
        }
    }

    /// Rebuild an account from stored state, version included.
    pub fn from_stored(
        id: Uuid,
        document: String,
        email: String,
        full_name: String,
        balance: Balance,
        account_type: AccountType,
        version: i64,
    ) -> Self {
        Self {
            id,
            document,
            email,
            full_name,
            balance,
            account_type,
            version,
        }
    }

    /// Account state after paying out `amount`.
    ///
    /// Refuses to drive the balance negative. This check runs on every
    /// commit attempt against freshly loaded state, guarding the race where
    /// a concurrent transfer spent the balance after the policy check.
    pub fn debited(&self, amount: &Amount) -> Result<Account, TransferError> {
        let balance = self.balance.debited(amount).map_err(|e| match e {
            AmountError::NegativeBalance => TransferError::insufficient_balance(),
            other => TransferError::Amount(other),
        })?;

        Ok(self.with_balance(balance))
    }

    /// Account state after receiving `amount`.
    pub fn credited(&self, amount: &Amount) -> Result<Account, TransferError> {
        let balance = self.balance.credited(amount)?;
        Ok(self.with_balance(balance))
    }

    fn with_balance(&self, balance: Balance) -> Account {
        Account {
            balance,
            version: self.version + 1,
            ..self.clone()
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn version(&self) -> i64 {
        self.version
    }
}

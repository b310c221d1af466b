//! Transfer records and request/result shapes
//!
//! `TransactionRecord` is the immutable persisted record of one committed
//! transfer. `TransferRequest` / `TransactionResult` are the engine's input
//! and output; views project participants to display-safe fields only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Account, AccountKey, Amount};

/// Immutable record of one completed transfer.
///
/// Created exactly once per successful commit, in the same atomic unit as
/// both balance updates. Never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub value: Amount,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(payer_id: Uuid, payee_id: Uuid, value: Amount, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payer_id,
            payee_id,
            value,
            timestamp,
        }
    }
}

/// Which side of a transfer a participant is queried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Payer,
    Payee,
    Either,
}

/// Input to a transfer: who gets paid and how much.
///
/// The payee is identified by the ambiguous document-or-email key; `Amount`
/// construction already guarantees the value is strictly positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub payee: AccountKey,
    pub value: Amount,
}

impl TransferRequest {
    pub fn new(payee: AccountKey, value: Amount) -> Self {
        Self { payee, value }
    }
}

/// Display-safe projection of an account holder.
///
/// Deliberately omits balance, document and internal ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub full_name: String,
    pub email: String,
}

impl From<&Account> for Participant {
    fn from(account: &Account) -> Self {
        Self {
            full_name: account.full_name().to_string(),
            email: account.email().to_string(),
        }
    }
}

/// Outcome of a successful transfer, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResult {
    pub record_id: Uuid,
    pub value: Amount,
    pub payer: Participant,
    pub payee: Participant,
    pub timestamp: DateTime<Utc>,
}

/// One history entry as returned by the query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferView {
    pub id: Uuid,
    pub value: Amount,
    pub payer: Participant,
    pub payee: Participant,
    pub timestamp: DateTime<Utc>,
}

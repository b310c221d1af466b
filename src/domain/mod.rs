//! Domain module
//!
//! Core domain types for the transfer protocol.

pub mod account;
pub mod amount;
pub mod transaction;

pub use account::{Account, AccountKey, AccountType};
pub use amount::{Amount, AmountError, Balance};
pub use transaction::{
    Participant, ParticipantRole, TransactionRecord, TransactionResult, TransferRequest,
    TransferView,
};

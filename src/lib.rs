//! payflow
//!
//! Peer-to-peer funds transfer core: resolves a payee, checks eligibility,
//! moves value between two account balances in one atomic commit, records
//! the transfer and notifies the payee. The HTTP/CLI surface, registration
//! and the concrete providers live outside this crate, behind the store and
//! gateway traits.

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod policy;
pub mod query;
pub mod store;

mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use domain::{
    Account, AccountKey, AccountType, Amount, AmountError, Balance, Participant,
    ParticipantRole, TransactionRecord, TransactionResult, TransferRequest, TransferView,
};
pub use engine::TransferEngine;
pub use error::{NotEligibleReason, QueryError, TransferError};
pub use gateway::{
    AuthorizationError, AuthorizationGateway, DeliveryError, LoggingNotifier,
    NotificationGateway, TransferNotice,
};
pub use policy::EligibilityPolicy;
pub use query::{DateRange, QueryService};
pub use store::{
    AccountStore, BalanceUpdate, InMemoryStore, PgStore, StoreError, TransactionStore,
    TransferCommit,
};

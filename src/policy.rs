//! Eligibility policy
//!
//! Pure decision function over the payer's current state: account-type
//! capability, balance sufficiency, then the optional external authorization.
//! No side effects; the transfer path re-runs it on every commit attempt.

use std::sync::Arc;

use crate::config::Config;
use crate::domain::{Account, Amount};
use crate::error::{NotEligibleReason, TransferError};
use crate::gateway::AuthorizationGateway;

/// Decides whether an account may originate a transfer of a given value.
#[derive(Clone, Default)]
pub struct EligibilityPolicy {
    authorization: Option<Arc<dyn AuthorizationGateway>>,
    fail_open: bool,
}

impl EligibilityPolicy {
    /// Policy with external authorization disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy wired from environment-sourced settings.
    ///
    /// The gateway is consulted only when `AUTHORIZATION_ENABLED` is set and
    /// a gateway is actually supplied; an enabled flag without a gateway
    /// logs a warning and leaves the check off.
    pub fn from_config(
        config: &Config,
        gateway: Option<Arc<dyn AuthorizationGateway>>,
    ) -> Self {
        if !config.authorization_enabled {
            return Self::new();
        }

        match gateway {
            Some(gateway) => Self::new()
                .with_authorization(gateway)
                .fail_open(config.authorization_fail_open),
            None => {
                tracing::warn!("authorization enabled but no gateway wired, check stays off");
                Self::new()
            }
        }
    }

    /// Enable the external authorization check.
    pub fn with_authorization(mut self, gateway: Arc<dyn AuthorizationGateway>) -> Self {
        self.authorization = Some(gateway);
        self
    }

    /// Fallback when the authorizer errors out. Default is fail-closed:
    /// money movement favors safety over availability.
    pub fn fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Check the payer against the transfer value.
    pub async fn check(&self, payer: &Account, value: &Amount) -> Result<(), TransferError> {
        if !payer.account_type().may_originate_transfers() {
            return Err(TransferError::NotEligible(
                NotEligibleReason::AccountTypeForbidden,
            ));
        }

        if !payer.balance().covers(value) {
            return Err(TransferError::NotEligible(
                NotEligibleReason::InsufficientBalance,
            ));
        }

        if let Some(gateway) = &self.authorization {
            let authorized = match gateway.authorize(payer.id(), value.value()).await {
                Ok(decision) => decision,
                Err(err) => {
                    tracing::warn!(
                        payer = %payer.id(),
                        error = %err,
                        fail_open = self.fail_open,
                        "authorization gateway unavailable, applying fallback"
                    );
                    self.fail_open
                }
            };

            if !authorized {
                return Err(TransferError::NotEligible(
                    NotEligibleReason::AuthorizationDenied,
                ));
            }
        }

        Ok(())
    }
}

//! Account Port (Driven Port)
//!
//! Supplies the account snapshot read once at cycle start. Unavailability
//! is fatal to the cycle: no trading happens against unknown balances.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::AccountState;

/// Account port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AccountError {
    /// Account data could not be fetched.
    #[error("Account state unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for reading account state.
#[async_trait]
pub trait AccountPort: Send + Sync {
    /// Read the current account state.
    ///
    /// `capital_override` replaces the reported total equity, used for
    /// simulated capital sizing.
    async fn get_account_state(
        &self,
        capital_override: Option<Decimal>,
    ) -> Result<AccountState, AccountError>;
}

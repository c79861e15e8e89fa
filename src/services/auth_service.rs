//! Domain service for registration and credential checks.
//!
//! Session start/end stays at the handler layer; this service only answers
//! whether credentials are good and what the account looks like.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Account DTO for responses. Carries no secret material.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub profile_image: String,
    pub background_image: String,
}

impl From<crate::db::Account> for AccountSummary {
    fn from(account: crate::db::Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            display_name: account.display_name,
            profile_image: account.profile_image,
            background_image: account.background_image,
        }
    }
}

/// Domain service trait for account management.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] on the `username` field when the
    /// name is already taken.
    async fn register(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<AccountSummary, AuthError>;

    /// Verifies credentials and returns the account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the pair does not
    /// match, without saying which half was wrong.
    async fn login(&self, username: &str, password: &str) -> Result<AccountSummary, AuthError>;

    /// Looks up the account behind a session id.
    async fn account_summary(&self, id: i32) -> Result<AccountSummary, AuthError>;
}

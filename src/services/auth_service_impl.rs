//! `SeaORM` implementation of the `AuthService` trait.

use crate::db::Store;
use crate::services::auth_service::{AccountSummary, AuthError, AuthService};
use async_trait::async_trait;

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<AccountSummary, AuthError> {
        // The unique index would also catch this, but checking first turns
        // the duplicate into a field error instead of a storage failure.
        if self
            .store
            .find_account_by_username(username)
            .await?
            .is_some()
        {
            return Err(AuthError::Validation {
                field: "username",
                message: "That username already exists, please choose a different one."
                    .to_string(),
            });
        }

        let account = self
            .store
            .create_account(username, display_name, password)
            .await?;

        Ok(AccountSummary::from(account))
    }

    async fn login(&self, username: &str, password: &str) -> Result<AccountSummary, AuthError> {
        let is_valid = self.store.verify_password(username, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let account = self
            .store
            .find_account_by_username(username)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(AccountSummary::from(account))
    }

    async fn account_summary(&self, id: i32) -> Result<AccountSummary, AuthError> {
        let account = self
            .store
            .find_account_by_id(id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        Ok(AccountSummary::from(account))
    }
}

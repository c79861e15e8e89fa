use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::constants::media;
use crate::entities::{accounts, prelude::*};

/// Account data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
    pub profile_image: String,
    pub background_image: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            is_admin: model.is_admin,
            profile_image: model.profile_image,
            background_image: model.background_image,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account by username")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    /// Insert a new account with the default placeholder images.
    /// The caller is expected to have checked the username for uniqueness;
    /// the unique index is the last line of defense.
    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Account> {
        let password = password.to_string();
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            username: Set(username.to_string()),
            display_name: Set(display_name.to_string()),
            password_hash: Set(password_hash),
            is_admin: Set(false),
            profile_image: Set(media::DEFAULT_PROFILE_IMAGE.to_string()),
            background_image: Set(media::DEFAULT_BACKGROUND_IMAGE.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert account")?;

        Ok(Account::from(model))
    }

    /// Verify a password for a username. Unknown usernames verify as false.
    /// Note: this uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let account = Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(false);
        };

        let password_hash = account.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_profile_image(&self, id: i32, filename: &str) -> Result<()> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for picture update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: accounts::ActiveModel = account.into();
        active.profile_image = Set(filename.to_string());
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with the library defaults.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

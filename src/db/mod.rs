use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::account::Account;
pub use repositories::icon::{IconLink, NewIcon};

/// Facade over the per-table repositories. Every write commits on its own;
/// there are no cross-statement transactions.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn icon_repo(&self) -> repositories::icon::IconRepository {
        repositories::icon::IconRepository::new(self.conn.clone())
    }

    pub async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_username(username).await
    }

    pub async fn find_account_by_id(&self, id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn create_account(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Account> {
        self.account_repo()
            .create(username, display_name, password)
            .await
    }

    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        self.account_repo()
            .verify_password(username, password)
            .await
    }

    pub async fn update_profile_image(&self, id: i32, filename: &str) -> Result<()> {
        self.account_repo().update_profile_image(id, filename).await
    }

    pub async fn create_icon(&self, account_id: i32, icon: NewIcon) -> Result<IconLink> {
        self.icon_repo().add(account_id, icon).await
    }

    pub async fn get_icon(&self, id: i32) -> Result<Option<IconLink>> {
        self.icon_repo().get(id).await
    }

    pub async fn list_icons_by_owner(&self, account_id: i32) -> Result<Vec<IconLink>> {
        self.icon_repo().list_by_owner(account_id).await
    }

    pub async fn delete_icon(&self, id: i32) -> Result<bool> {
        self.icon_repo().remove(id).await
    }
}

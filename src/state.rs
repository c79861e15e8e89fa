use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, MediaService, SeaOrmAuthService};

/// Everything the request handlers need, built once at startup and passed
/// in explicitly. There are no module-level singletons.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub media: Arc<MediaService>,

    pub start_time: Instant,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let media = Arc::new(MediaService::new(config.media.clone()));
        media.ensure_directories().await?;

        let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(store.clone()));

        Ok(Arc::new(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth,
            media,
            start_time: Instant::now(),
        }))
    }
}

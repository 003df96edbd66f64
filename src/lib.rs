pub mod config;
pub mod controllers;
pub mod error;
pub mod map;
pub mod models;
pub mod services;

use std::sync::Arc;
use tracing::{info, warn};

pub use error::{MapError, MapResult};

use services::selection_store::{MemorySelectionStore, SelectionStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub venue: Arc<models::Venue>,
    pub store: Arc<dyn SelectionStore>,
}

impl AppState {
    pub async fn new(config: config::Config) -> MapResult<Arc<Self>> {
        let venue = services::venue_loader::load_venue(&config.venue.source).await?;
        let store = selection_store(&config).await;
        info!("Selection store: {}", store.backend());

        Ok(Arc::new(Self {
            config,
            venue: Arc::new(venue),
            store,
        }))
    }
}

#[cfg(feature = "redis-store")]
async fn selection_store(config: &config::Config) -> Arc<dyn SelectionStore> {
    let Some(url) = config.redis.url.as_deref() else {
        return Arc::new(MemorySelectionStore::new());
    };
    match services::selection_store::RedisSelectionStore::connect(url).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            // Без Redis работаем, но выбор не переживёт рестарт
            warn!("Redis unavailable ({}), keeping selections in memory", e);
            Arc::new(MemorySelectionStore::new())
        }
    }
}

#[cfg(not(feature = "redis-store"))]
async fn selection_store(config: &config::Config) -> Arc<dyn SelectionStore> {
    if config.redis.url.is_some() {
        warn!("REDIS_URL is set but the redis-store feature is off, keeping selections in memory");
    }
    Arc::new(MemorySelectionStore::new())
}

//! Persistence of a viewer's selection between sessions.
//!
//! The map engine only hands over and takes back an ordered seat snapshot;
//! where it lives is decided here. Two backends: Redis (shared, survives
//! restarts) and process memory (used when no Redis URL is configured).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::MapResult;
use crate::models::{Seat, SelectionSet};

/// Saved selection. Seats are kept in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSelection {
    pub seats: Vec<Seat>,
    pub saved_at: DateTime<Utc>,
}

impl StoredSelection {
    pub fn of(selection: &SelectionSet) -> Self {
        Self {
            seats: selection.iter().cloned().collect(),
            saved_at: Utc::now(),
        }
    }
}

pub fn selection_key(venue_id: &str, client_id: &str) -> String {
    format!("selection:{}:{}", venue_id, client_id)
}

#[async_trait]
pub trait SelectionStore: Send + Sync + 'static {
    async fn load(&self, venue_id: &str, client_id: &str) -> MapResult<Option<StoredSelection>>;

    async fn save(&self, venue_id: &str, client_id: &str, selection: &SelectionSet) -> MapResult<()>;

    async fn clear(&self, venue_id: &str, client_id: &str) -> MapResult<()>;

    fn backend(&self) -> &'static str;
}

/// In-process store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    entries: RwLock<HashMap<String, StoredSelection>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SelectionStore for MemorySelectionStore {
    async fn load(&self, venue_id: &str, client_id: &str) -> MapResult<Option<StoredSelection>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&selection_key(venue_id, client_id)).cloned())
    }

    async fn save(&self, venue_id: &str, client_id: &str, selection: &SelectionSet) -> MapResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(selection_key(venue_id, client_id), StoredSelection::of(selection));
        Ok(())
    }

    async fn clear(&self, venue_id: &str, client_id: &str) -> MapResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&selection_key(venue_id, client_id));
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(feature = "redis-store")]
pub use self::redis_store::RedisSelectionStore;

#[cfg(feature = "redis-store")]
mod redis_store {
    use super::*;
    use redis::aio::ConnectionManager;
    use redis::AsyncCommands;
    use tracing::{debug, info};

    // Брошенные выборы живут неделю
    const SELECTION_TTL_SECONDS: u64 = 7 * 24 * 3600;

    /// Redis-backed store. The connection manager reconnects on its own,
    /// so a dropped link only fails the calls made while it is down.
    #[derive(Clone)]
    pub struct RedisSelectionStore {
        conn: ConnectionManager,
    }

    impl RedisSelectionStore {
        pub async fn connect(redis_url: &str) -> MapResult<Self> {
            let client = redis::Client::open(redis_url)?;
            let mut conn = ConnectionManager::new(client).await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            info!("Redis connected");
            Ok(Self { conn })
        }
    }

    #[async_trait]
    impl SelectionStore for RedisSelectionStore {
        async fn load(&self, venue_id: &str, client_id: &str) -> MapResult<Option<StoredSelection>> {
            let mut conn = self.conn.clone();
            let data: Option<String> = conn.get(selection_key(venue_id, client_id)).await?;
            match data {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            }
        }

        async fn save(&self, venue_id: &str, client_id: &str, selection: &SelectionSet) -> MapResult<()> {
            let key = selection_key(venue_id, client_id);
            let data = serde_json::to_string(&StoredSelection::of(selection))?;
            let mut conn = self.conn.clone();
            let _: () = conn.set_ex(&key, data, SELECTION_TTL_SECONDS).await?;
            debug!("Saved selection {} ({} seats)", key, selection.len());
            Ok(())
        }

        async fn clear(&self, venue_id: &str, client_id: &str) -> MapResult<()> {
            let mut conn = self.conn.clone();
            let _: () = conn.del(selection_key(venue_id, client_id)).await?;
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "redis"
        }
    }
}

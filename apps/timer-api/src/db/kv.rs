use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::AsyncCommands;

use crate::error::ApiError;

/// Abstraction over the key-value store holding per-visitor countdown state.
///
/// Backed by Redis in production and an in-memory map in tests.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), ApiError>;
    async fn get(&self, key: &str) -> Result<Option<String>, ApiError>;
    async fn del(&self, key: &str) -> Result<(), ApiError>;

    /// Set `key` only when it does not exist yet. Returns whether the value was written.
    ///
    /// The default is a plain read followed by a write, so two callers can both
    /// succeed. Stores with a native compare-and-set override it.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, ApiError> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set_ex(key, value, ttl_secs).await?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (single process / tests)
// ---------------------------------------------------------------------------

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Writes between two sweeps of expired entries.
const SWEEP_EVERY: u64 = 64;

pub struct MemoryStore {
    data: Mutex<HashMap<String, Entry>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    /// Drop expired entries every [`SWEEP_EVERY`] writes. Visitors that never
    /// come back are otherwise only evicted when their key is read.
    fn sweep_if_due(&self, data: &mut HashMap<String, Entry>, now: Instant) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            data.retain(|_, entry| entry.expires_at > now);
        }
    }

    /// Expiry instant of a live key.
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        let data = self.data.lock();
        data.get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.expires_at)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), ApiError> {
        let now = Instant::now();
        let mut data = self.data.lock();
        self.sweep_if_due(&mut data, now);
        data.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let mut data = self.data.lock();
        match data.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                data.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> Result<(), ApiError> {
        self.data.lock().remove(key);
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, ApiError> {
        let now = Instant::now();
        let mut data = self.data.lock();
        if data.get(key).is_some_and(|entry| entry.expires_at > now) {
            return Ok(false);
        }
        self.sweep_if_due(&mut data, now);
        data.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + Duration::from_secs(ttl_secs),
            },
        );
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Redis implementation
// ---------------------------------------------------------------------------

pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = redis::aio::ConnectionManager::new(client).await?;
        tracing::info!("redis connection established");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| {
                tracing::error!(?e, "redis set failed");
                ApiError::internal("Failed to store value")
            })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| {
            tracing::error!(?e, "redis get failed");
            ApiError::internal("Lookup failed")
        })
    }

    async fn del(&self, key: &str) -> Result<(), ApiError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(|e| {
            tracing::error!(?e, "redis del failed");
            ApiError::internal("Delete failed")
        })
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, ApiError> {
        let mut conn = self.conn.clone();
        // SET key value NX EX ttl replies OK when written and nil otherwise.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(?e, "redis set nx failed");
                ApiError::internal("Failed to store value")
            })?;
        Ok(reply.is_some())
    }
}

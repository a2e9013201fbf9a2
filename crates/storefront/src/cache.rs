//! Key-value cache for carts and user details.
//!
//! Backed by Redis when `REDIS_URL` is set, otherwise by an in-process `moka`
//! cache so a single instance works without Redis. Values are stored as JSON
//! and every entry expires after [`ENTRY_TTL`].

use std::time::Duration;

use moka::future::Cache;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use flagstone_core::UserId;

/// Lifetime of every cache entry.
pub const ENTRY_TTL: Duration = Duration::from_secs(60 * 60);

const MEMORY_CAPACITY: u64 = 10_000;

/// Cache key of a user's cache-only cart.
#[must_use]
pub fn cart_key(user_id: UserId) -> String {
    format!("cart:user:{user_id}")
}

/// Cache key of a user's profile details.
#[must_use]
pub fn user_details_key(user_id: UserId) -> String {
    format!("user-details:user:{user_id}")
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The cache backend.
#[derive(Clone)]
pub enum CacheStore {
    Redis(ConnectionManager),
    Memory(Cache<String, String>),
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis(_) => f.write_str("CacheStore::Redis"),
            Self::Memory(cache) => write!(f, "CacheStore::Memory({} entries)", cache.entry_count()),
        }
    }
}

impl CacheStore {
    /// Connect to Redis, or fall back to memory when no URL is configured.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the URL is invalid or Redis is unreachable.
    pub async fn connect(redis_url: Option<&SecretString>) -> Result<Self, CacheError> {
        let Some(url) = redis_url else {
            tracing::warn!("REDIS_URL not set, using in-memory cache");
            return Ok(Self::in_memory());
        };

        let client = redis::Client::open(url.expose_secret())?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis");
        Ok(Self::Redis(manager))
    }

    /// An in-process cache.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(
            Cache::builder()
                .max_capacity(MEMORY_CAPACITY)
                .time_to_live(ENTRY_TTL)
                .build(),
        )
    }

    /// Read and decode a JSON value.
    ///
    /// An entry that no longer decodes is dropped and reported as a miss.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if Redis fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw: Option<String> = match self {
            Self::Redis(manager) => manager.clone().get(key).await?,
            Self::Memory(cache) => cache.get(key).await,
        };

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Dropping undecodable cache entry");
                self.delete(key).await?;
                Ok(None)
            }
        }
    }

    /// Encode and store a JSON value for [`ENTRY_TTL`].
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if encoding or Redis fails.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        match self {
            Self::Redis(manager) => {
                let () = manager
                    .clone()
                    .set_ex(key, raw, ENTRY_TTL.as_secs())
                    .await?;
            }
            Self::Memory(cache) => cache.insert(key.to_string(), raw).await,
        }
        Ok(())
    }

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if Redis fails.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::Redis(manager) => {
                let _: i64 = manager.clone().del(key).await?;
            }
            Self::Memory(cache) => cache.invalidate(key).await,
        }
        Ok(())
    }

    /// Check the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if Redis does not answer.
    pub async fn ping(&self) -> Result<(), CacheError> {
        if let Self::Redis(manager) = self {
            let _: String = redis::cmd("PING").query_async(&mut manager.clone()).await?;
        }
        Ok(())
    }
}

//! Redis connection setup.

use redis::aio::ConnectionManager;

use crate::error::CacheError;
use crate::geo_index::RedisGeoIndex;
use crate::snapshot_store::RedisSnapshotStore;

/// Configuration for the Redis cache adapter.
pub struct Config {
    /// Redis connection URL (e.g. `redis://localhost:6379`).
    pub redis_url: String,
}

impl Config {
    /// Read configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `GEOFENCE_REDIS_URL` is not set.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            redis_url: std::env::var("GEOFENCE_REDIS_URL")?,
        })
    }

    /// Open the client and establish the managed connection.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the URL is invalid or the server is not
    /// reachable.
    pub async fn build(self) -> Result<RedisCache, CacheError> {
        let client = redis::Client::open(self.redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        tracing::debug!("redis connection established");
        Ok(RedisCache { manager })
    }
}

/// A live Redis connection shared by the cache adapters.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    #[must_use]
    pub fn geo_index(&self) -> RedisGeoIndex {
        RedisGeoIndex::new(self.manager.clone())
    }

    #[must_use]
    pub fn snapshot_store(&self) -> RedisSnapshotStore {
        RedisSnapshotStore::new(self.manager.clone())
    }
}

/// Connect to the server named by `GEOFENCE_TEST_REDIS_URL`.
#[cfg(test)]
pub(crate) async fn test_cache() -> RedisCache {
    let redis_url = std::env::var("GEOFENCE_TEST_REDIS_URL")
        .expect("GEOFENCE_TEST_REDIS_URL must point to a Redis server");
    Config { redis_url }.build().await.unwrap()
}

//! Redis-backed store for production deployments

use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use fred::types::Expiration;
use tracing::info;

use super::{StoreError, TimerStore};

/// Connection handle to a Redis-compatible instance
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// Connect using a `redis://host:port` URL
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("invalid Redis URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        info!("Connected to Redis");
        Ok(Self { client })
    }
}

#[async_trait]
impl TimerStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let expire = Expiration::EX(ttl.as_secs() as i64);
        let _: () = self
            .client
            .set(key, value.as_str(), Some(expire), None, false)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }
}

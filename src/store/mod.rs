//! Durable key-value store used for restart recovery
//!
//! The timer authority mirrors every state mutation into this store so a run
//! survives a process restart. Only the authority touches it; observers never
//! read or write the store directly.

pub mod memory;
pub mod redis;

// Re-export main types
pub use memory::MemoryStore;
pub use redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

/// Fixed key the serialized timer lives under
pub const TIMER_KEY: &str = "shared_timer";

/// Leak backstop for the persisted timer entry (1 hour).
///
/// Not a semantic deadline: the authority deletes the entry itself when a
/// run ends, the TTL only reclaims entries orphaned by a crash.
pub const TIMER_TTL: Duration = Duration::from_secs(3600);

/// Errors surfaced by the durable store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A Redis operation failed
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::Error),

    /// The store could not be configured (bad URL)
    #[error("store configuration error: {0}")]
    Config(String),
}

/// Contract the timer authority needs from its durable store: string
/// get/put/delete with a per-entry time-to-live.
#[async_trait]
pub trait TimerStore: Send + Sync {
    /// Read the value at `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` at `key`, replacing any previous entry
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

//! Shared Timer - a persisted, broadcast countdown timer service
//!
//! One timer per process, observed consistently by every connected client:
//! commands arrive over HTTP or WebSocket, every state change fans out to
//! all observers, and the canonical state is mirrored to a durable store so
//! a run survives a server restart.

pub mod api;
pub mod config;
pub mod state;
pub mod store;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use timer::{TimerAuthority, TimerEvent};
pub use utils::shutdown_signal;

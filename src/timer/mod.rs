//! Shared countdown timer core
//!
//! The authority owns canonical state and command processing; the events
//! module defines the wire protocol observers and clients speak.

pub mod authority;
pub mod events;

// Re-export main types
pub use authority::TimerAuthority;
pub use events::{TimerCommand, TimerEvent, TimerStateReply};

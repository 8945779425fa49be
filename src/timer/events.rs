//! Wire-level timer protocol: broadcast events, client commands, query replies

use serde::{Deserialize, Serialize};

/// Events fanned out to every connected observer.
///
/// Tags and payload field names match the original socket protocol so
/// existing clients keep working unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerEvent {
    /// A new run began; also emitted when a running timer is replaced
    #[serde(rename_all = "camelCase")]
    TimerStarted {
        start_time: i64,
        end_time: i64,
        duration: i64,
    },
    /// Periodic countdown update, broadcast once per tick while running
    #[serde(rename_all = "camelCase")]
    TimerUpdate {
        is_active: bool,
        time_left: i64,
        start_time: i64,
        end_time: i64,
    },
    /// The run reached its end time; emitted exactly once per run
    TimerEnded,
    /// A client stopped the run
    TimerStopped,
    /// A client cleared the timer
    TimerReset,
}

/// Commands a connected client may send over the WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerCommand {
    /// Start (or replace) the shared countdown
    StartTimer {
        /// Run length in milliseconds; server default when omitted
        #[serde(default)]
        duration: Option<i64>,
    },
    /// Stop the running countdown
    StopTimer,
    /// Clear the countdown unconditionally
    ResetTimer,
    /// Request the current state, answered unicast on the issuing socket
    GetTimerState,
}

/// Unicast reply to a state query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStateReply {
    pub is_active: bool,
    /// Milliseconds remaining, clamped to zero
    pub time_left: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

impl TimerStateReply {
    /// Reply for a running timer
    pub fn active(time_left: i64, start_time: i64, end_time: i64) -> Self {
        Self {
            is_active: true,
            time_left,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }

    /// Reply when no timer is running
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            time_left: 0,
            start_time: None,
            end_time: None,
        }
    }
}

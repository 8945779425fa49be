//! Canonical timer state and its time arithmetic

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Canonical countdown timer state.
///
/// A single instance exists per process while a run is in flight. The
/// serialized form (camelCase fields) is also the persisted layout in the
/// durable store, so a run can be recovered after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Whether the countdown is currently running
    pub is_active: bool,
    /// When the current run began, in milliseconds since the epoch
    pub start_time: i64,
    /// Configured length of this run in milliseconds
    pub duration: i64,
    /// Authoritative termination instant: `start_time + duration`
    pub end_time: i64,
}

impl TimerState {
    /// Create the state for a run beginning at `start_time`.
    ///
    /// This is the only constructor, which keeps the
    /// `end_time == start_time + duration` invariant in one place.
    pub fn started(start_time: i64, duration: i64) -> Self {
        Self {
            is_active: true,
            start_time,
            duration,
            end_time: start_time + duration,
        }
    }

    /// Milliseconds until `end_time`, clamped to zero
    pub fn time_left(&self, now: i64) -> i64 {
        (self.end_time - now).max(0)
    }

    /// Whether the run's termination instant has passed
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.end_time
    }
}

/// Current wall-clock time in integer milliseconds since the epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_enforces_end_time_invariant() {
        let state = TimerState::started(1_000, 60_000);
        assert!(state.is_active);
        assert_eq!(state.end_time, state.start_time + state.duration);
    }

    #[test]
    fn time_left_is_clamped_to_zero() {
        let state = TimerState::started(1_000, 500);
        assert_eq!(state.time_left(1_000), 500);
        assert_eq!(state.time_left(1_499), 1);
        assert_eq!(state.time_left(1_500), 0);
        assert_eq!(state.time_left(9_999), 0);
    }

    #[test]
    fn expiry_is_inclusive_of_end_time() {
        let state = TimerState::started(0, 100);
        assert!(!state.is_expired(99));
        assert!(state.is_expired(100));
        assert!(state.is_expired(101));
    }

    #[test]
    fn persisted_layout_uses_camel_case_fields() {
        let json = r#"{"isActive":true,"startTime":100,"duration":60000,"endTime":60100}"#;
        let state: TimerState = serde_json::from_str(json).unwrap();
        assert_eq!(state, TimerState::started(100, 60_000));
        assert_eq!(serde_json::to_string(&state).unwrap(), json);
    }
}

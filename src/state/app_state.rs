//! Main application state

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::timer::TimerAuthority;

/// Application state shared by every handler
pub struct AppState {
    /// The single owner of canonical timer state
    pub timer: Arc<TimerAuthority>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    pub last_command: Mutex<Option<String>>,
    pub last_command_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create a new `AppState` around an already-constructed authority
    pub fn new(timer: Arc<TimerAuthority>, port: u16, host: String) -> Self {
        Self {
            timer,
            start_time: Instant::now(),
            port,
            host,
            last_command: Mutex::new(None),
            last_command_time: Mutex::new(None),
        }
    }

    /// Record the most recent timer command for the status endpoint
    pub fn record_command(&self, command: &str) {
        if let Ok(mut last) = self.last_command.lock() {
            *last = Some(command.to_string());
        }
        if let Ok(mut last_time) = self.last_command_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last command information
    pub fn get_last_command(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_command = self.last_command.lock().ok().and_then(|c| c.clone());
        let last_command_time = self.last_command_time.lock().ok().and_then(|t| *t);
        (last_command, last_command_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

//! Configuration and CLI argument handling

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "shared-timer")]
#[command(about = "A persisted, broadcast countdown timer shared by every connected client")]
#[command(version = "0.4.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "4100")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Default run length in milliseconds when a start carries no duration
    #[arg(short, long, default_value = "60000")]
    pub duration: i64,

    /// Broadcast tick interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub tick_interval: u64,

    /// Redis URL for restart recovery (e.g. redis://127.0.0.1:6379);
    /// falls back to an in-process store when omitted
    #[arg(long)]
    pub redis_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

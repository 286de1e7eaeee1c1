//! Server configuration
//!
//! Every setting can be passed as a flag or through a `RELAY_*` environment
//! variable.

use clap::Parser;
use relay_core::domain::poll::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS, PollConfig};
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "relay-server")]
#[command(about = "Caches API routes and dispatches them to a remote job service", long_about = None)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "RELAY_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Base URL of the remote job service (e.g., "https://jobs.example.com")
    #[arg(long, env = "RELAY_JOB_SERVICE_URL")]
    pub job_service_url: String,

    /// Default delay between two run status fetches
    #[arg(long, env = "RELAY_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Default upper bound on the wait for a run to finish
    #[arg(long, env = "RELAY_POLL_TIMEOUT_MS", default_value_t = DEFAULT_POLL_TIMEOUT_MS)]
    pub poll_timeout_ms: u64,

    /// Timeout of a single request to the job service
    #[arg(long, env = "RELAY_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn poll_defaults(&self) -> PollConfig {
        PollConfig::new(self.poll_interval_ms, self.poll_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.job_service_url.is_empty() {
            anyhow::bail!("job_service_url cannot be empty");
        }

        if !self.job_service_url.starts_with("http://")
            && !self.job_service_url.starts_with("https://")
        {
            anyhow::bail!("job_service_url must start with http:// or https://");
        }

        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::StreamError;

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Upper bound on a single signal wait inside the capture loop (default: 1000).
    pub wait_timeout_ms: u64,

    /// Number of wait timeouts `close` allows the worker to exit (default: 3).
    pub join_retry_bound: u32,

    /// Largest transport `setup` will allocate, in bytes (default: 64 MiB).
    pub max_transport_bytes: usize,

    /// Pass `start`/`stop` through to the device instead of treating them as no-ops.
    pub mmap_mode: bool,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.wait_timeout_ms == 0 {
            return Err("wait timeout must be positive".into());
        }
        if self.join_retry_bound == 0 {
            return Err("join retry bound must be positive".into());
        }
        if self.max_transport_bytes == 0 {
            return Err("max transport size must be positive".into());
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StreamError::InvalidArguments(format!("bad session config: {}", e)))?;
        config.validate().map_err(StreamError::InvalidArguments)?;
        Ok(config)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Longest time `close` waits for the worker before giving up on it.
    pub fn join_timeout(&self) -> Duration {
        self.wait_timeout() * self.join_retry_bound
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 1000,
            join_retry_bound: 3,
            max_transport_bytes: 64 * 1024 * 1024,
            mmap_mode: false,
        }
    }
}

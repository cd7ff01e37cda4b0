//! Session configuration
//!
//! Sessions are configured in code or from YAML:
//!
//! ```yaml
//! max_source_errors: 5
//! deliver_empty_passes: false
//! channel_capacity: 512
//! replay_frame_interval_ms: 2
//! stats_rate: !Max 4
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::types::UpdateRate;
use crate::{LinkError, Result};

/// Tunables for one device session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Consecutive frame source errors tolerated before the inbound side stops
    pub max_source_errors: u32,

    /// Invoke the consumer even when a pass finds no new photos
    pub deliver_empty_passes: bool,

    /// Frames buffered between a push handle and the session
    pub channel_capacity: usize,

    /// Pacing between replayed frames; unset replays as fast as possible
    pub replay_frame_interval_ms: Option<u64>,

    /// Default rate for stats update streams
    pub stats_rate: UpdateRate,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_source_errors: 10,
            deliver_empty_passes: false,
            channel_capacity: 256,
            replay_frame_interval_ms: None,
            stats_rate: UpdateRate::Native,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LinkError::config(format!("YAML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| LinkError::file_error(path.to_path_buf(), e))?;

        debug!("Loaded session configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_source_errors == 0 {
            return Err(LinkError::config("max_source_errors must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(LinkError::config("channel_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Replay pacing as a duration
    pub fn replay_frame_interval(&self) -> Option<Duration> {
        self.replay_frame_interval_ms.map(Duration::from_millis)
    }
}

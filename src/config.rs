//! Recorder configuration
//!
//! Configuration is a YAML document; every field has a default so an empty
//! or missing file yields the reference deployment (capture server on
//! `127.0.0.1:9000`, preview stream on port `9001`, batches of five).
//!
//! ```yaml
//! control:
//!   host: 127.0.0.1
//!   port: 9000
//!   response_timeout_ms: 5000
//! stream:
//!   port: 9001
//!   queue_capacity: 8
//! session:
//!   batch_size: 5
//!   countdown_secs: 3
//!   queue_state_path: queue_state.yaml
//! pool:
//!   clip_directory: ./trialPreview/0.6x
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::scheduler::DEFAULT_BATCH_SIZE;
use crate::session::DEFAULT_COUNTDOWN_SECS;
use crate::{RecorderError, Result};

/// Control channel endpoint and deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub host: String,
    pub port: u16,
    pub response_timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 9000, response_timeout_ms: 5000 }
    }
}

impl ControlConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Preview stream socket and hand-off queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Local port the frame receiver binds
    pub port: u16,
    /// Receive buffer size; frames larger than this are truncated by the OS
    pub max_datagram: usize,
    /// Bound on queued frames; oldest are discarded first. `None` is unbounded.
    pub queue_capacity: Option<usize>,
    /// How long `stop()` waits for the receiver to finish
    pub join_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { port: 9001, max_datagram: 65_507, queue_capacity: None, join_timeout_ms: 1000 }
    }
}

impl StreamConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Recording session shape and queue persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub batch_size: usize,
    pub countdown_secs: u32,
    pub queue_state_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            queue_state_path: PathBuf::from("queue_state.yaml"),
        }
    }
}

/// Where the gesture pool is discovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub clip_directory: Option<PathBuf>,
    pub clip_extension: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { clip_directory: None, clip_extension: "mp4".to_string() }
    }
}

/// Top-level recorder configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub control: ControlConfig,
    pub stream: StreamConfig,
    pub session: SessionConfig,
    pub pool: PoolConfig,
}

impl RecorderConfig {
    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| RecorderError::parse("RecorderConfig deserialization", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(yaml) => {
                info!("Loaded configuration from {}", path.display());
                Self::parse(&yaml)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(RecorderError::config(format!("cannot read {}: {e}", path.display()))),
        }
    }

    /// Reject values that would make the recorder unusable.
    pub fn validate(&self) -> Result<()> {
        if self.session.batch_size == 0 {
            return Err(RecorderError::config("session.batch_size must be at least 1"));
        }
        if self.control.port == 0 {
            return Err(RecorderError::config("control.port must be non-zero"));
        }
        if self.control.response_timeout_ms == 0 {
            return Err(RecorderError::config("control.response_timeout_ms must be non-zero"));
        }
        if self.stream.max_datagram < crate::types::LENGTH_PREFIX_LEN {
            return Err(RecorderError::config("stream.max_datagram is smaller than a frame header"));
        }
        if self.stream.queue_capacity == Some(0) {
            return Err(RecorderError::config("stream.queue_capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = RecorderConfig::default();
        assert_eq!(config.control.endpoint(), "127.0.0.1:9000");
        assert_eq!(config.control.response_timeout(), Duration::from_secs(5));
        assert_eq!(config.stream.port, 9001);
        assert_eq!(config.session.batch_size, 5);
        assert_eq!(config.session.countdown_secs, 3);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = RecorderConfig::parse("control:\n  port: 9100\nstream:\n  queue_capacity: 4\n")
            .expect("config should parse");
        assert_eq!(config.control.port, 9100);
        assert_eq!(config.control.host, "127.0.0.1");
        assert_eq!(config.stream.queue_capacity, Some(4));
        assert_eq!(config.session.batch_size, 5);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(RecorderConfig::parse("").unwrap(), RecorderConfig::default());
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = RecorderConfig::parse("control: [not, a, map").unwrap_err();
        assert!(matches!(err, RecorderError::Parse { .. }));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = RecorderConfig::parse("session:\n  batch_size: 0\n").unwrap_err();
        assert!(matches!(err, RecorderError::Config { .. }));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = RecorderConfig::load("/nonexistent/gesture-recorder/config.yaml").unwrap();
        assert_eq!(config, RecorderConfig::default());
    }
}

//! Camera configuration
//!
//! All settle delays are blind waits: the camera has no ready line, so each
//! command gets a fixed time to finish before its reply is read.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{
    DEFAULT_BAUD_RATE, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNK_ATTEMPTS, DEFAULT_PORT,
};

/// Errors loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Per-command settle delays in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub get_version_ms: u64,
    pub reset_ms: u64,
    pub photo_size_ms: u64,
    pub compression_ms: u64,
    pub color_mode_ms: u64,
    /// Freezing a frame can take seconds while the JPEG is encoded
    pub capture_ms: u64,
    pub buffer_len_ms: u64,
    pub read_chunk_ms: u64,
    pub frame_control_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            get_version_ms: 10,
            reset_ms: 1000,
            photo_size_ms: 100,
            compression_ms: 10,
            color_mode_ms: 10,
            capture_ms: 5000,
            buffer_len_ms: 500,
            read_chunk_ms: 500,
            frame_control_ms: 10,
        }
    }
}

impl Timings {
    /// No settle delay at all, for simulated cameras
    pub fn none() -> Self {
        Self {
            get_version_ms: 0,
            reset_ms: 0,
            photo_size_ms: 0,
            compression_ms: 0,
            color_mode_ms: 0,
            capture_ms: 0,
            buffer_len_ms: 0,
            read_chunk_ms: 0,
            frame_control_ms: 0,
        }
    }

    pub(crate) fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }
}

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Image bytes requested per read-buffer transaction
    pub chunk_size: u32,
    /// Failed chunk reads tolerated over one whole transfer
    pub max_chunk_attempts: u8,
    /// Settle delays
    pub timings: Timings,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunk_attempts: DEFAULT_MAX_CHUNK_ATTEMPTS,
            timings: Timings::default(),
        }
    }
}

impl CameraConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the transfer engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chunk_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_chunk_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_chunk_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::InvalidValue {
                field: "baud_rate",
                message: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_camera_config_default() {
        let config = CameraConfig::default();
        assert_eq!(config.port_name, "/dev/ttyAMA0");
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.chunk_size, 256);
        assert_eq!(config.max_chunk_attempts, 5);
        assert_eq!(config.timings.capture_ms, 5000);
        assert_eq!(config.timings.read_chunk_ms, 500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            CameraConfig::from_json(r#"{ "baud_rate": 115200, "timings": { "reset_ms": 2000 } }"#)
                .expect("valid config");
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.timings.reset_ms, 2000);
        assert_eq!(config.timings.capture_ms, 5000);
        assert_eq!(config.chunk_size, 256);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let err = CameraConfig::from_json(r#"{ "chunk_size": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "chunk_size",
                ..
            }
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "port_name": "/dev/ttyUSB0", "chunk_size": 512 }}"#).expect("write");

        let config = CameraConfig::from_file(file.path()).expect("load");
        assert_eq!(config.port_name, "/dev/ttyUSB0");
        assert_eq!(config.chunk_size, 512);
    }

    #[test]
    fn test_from_file_missing() {
        let err = CameraConfig::from_file("/nonexistent/vc0706.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

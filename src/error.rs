//! Error types for the photo link.
//!
//! Only a few of these ever reach an end user. Decoding and reassembly
//! contain corruption themselves: a malformed frame is counted and dropped,
//! a stray completion marker is a no-op. What does surface is consumer
//! failure ("processing of recent photos failed, will retry"), transform
//! failure, and problems opening sources or configuration.
//!
//! ## Error Categories
//!
//! - **Frame Errors**: notifications too short to carry a header
//! - **Source Errors**: the link layer failed to deliver frames
//! - **Transform Errors**: a completed photo was rejected by the blob transform
//! - **Consumer Errors**: a downstream processing pass failed
//! - **Capture/File Errors**: problems reading or writing frame captures
//! - **Config Errors**: invalid session configuration
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use glasslink::LinkError;
//!
//! let error = LinkError::source_failed("adapter powered off");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TransferId;

/// Boxed error used for collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for photo link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for photo link operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Malformed frame: {len} bytes is shorter than the 4-byte header")]
    MalformedFrame { len: usize },

    #[error("Frame source failed: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Blob transform failed for transfer {transfer}")]
    Transform {
        transfer: TransferId,
        #[source]
        source: BoxError,
    },

    #[error("Processing of recent photos failed, will retry")]
    Consumer {
        #[source]
        source: BoxError,
    },

    #[error("Invalid capture {path}: {details}")]
    Capture { path: PathBuf, details: String },

    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("Photo session is closed")]
    Closed,
}

impl LinkError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::Source { .. } => true,
            LinkError::Consumer { .. } => true,
            LinkError::MalformedFrame { .. } => false,
            LinkError::Transform { .. } => false,
            LinkError::Capture { .. } => false,
            LinkError::File { .. } => false,
            LinkError::Config { .. } => false,
            LinkError::Closed => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LinkError::MalformedFrame { .. } => vec![
                "Check the device firmware frame format",
                "Verify the subscription targets the photo characteristic",
            ],
            LinkError::Source { .. } => vec![
                "Check the device is powered and in range",
                "Reconnect to the device",
                "Restart the Bluetooth adapter",
            ],
            LinkError::Transform { .. } => vec![
                "Verify the device sends JPEG photos",
                "Disable the photo transform to inspect raw payloads",
            ],
            LinkError::Consumer { .. } => vec![
                "Wait for the next photo to trigger a retry",
                "Check connectivity to the analysis service",
            ],
            LinkError::Capture { .. } => vec![
                "Verify the file is a glasslink frame capture",
                "Re-record the capture if it was truncated",
            ],
            LinkError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
                "Ensure sufficient disk space",
            ],
            LinkError::Config { .. } => vec![
                "Check configuration field names and values",
                "Remove unknown fields from the configuration file",
            ],
            LinkError::Closed => vec!["Attach a new session to the device"],
        }
    }

    /// Helper constructor for source errors.
    pub fn source_failed(reason: impl Into<String>) -> Self {
        LinkError::Source { reason: reason.into(), source: None }
    }

    /// Helper constructor for source errors with an underlying cause.
    pub fn source_failed_with_source(reason: impl Into<String>, source: BoxError) -> Self {
        LinkError::Source { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for transform errors.
    pub fn transform_failed(transfer: TransferId, source: BoxError) -> Self {
        LinkError::Transform { transfer, source }
    }

    /// Helper constructor for consumer errors.
    pub fn consumer_failed(source: anyhow::Error) -> Self {
        LinkError::Consumer { source: source.into() }
    }

    /// Helper constructor for capture format errors.
    pub fn capture_error(path: PathBuf, details: impl Into<String>) -> Self {
        LinkError::Capture { path, details: details.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        LinkError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        LinkError::Config { details: details.into() }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

//! Error types for gomodscan.
//!
//! Fatal conditions (unrecognized input, corrupt container headers,
//! unsupported word size or byte order, I/O) abort an extraction. The
//! build-info variants are confined to the build-info result field so that
//! symbol extraction still completes.

use crate::formats::ContainerKind;
use crate::io::error::IoError;
use thiserror::Error;

/// Main error type for gomodscan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No supported container magic at the start of the input
    #[error("Unrecognized executable format")]
    UnrecognizedFormat,

    /// Section, segment or load-command table is corrupt or truncated
    #[error("Malformed {kind} header: {message}")]
    MalformedHeader {
        kind: ContainerKind,
        message: String,
    },

    /// Recognized container with an unhandled word size or byte order
    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// The image carries no Go build information blob
    #[error("No Go build information found")]
    NoBuildInfo,

    /// Build information blob is present but cannot be decoded
    #[error("Malformed build information: {0}")]
    MalformedBuildInfo(String),

    /// Build information header uses flag bits this decoder does not know
    #[error("Unsupported build information format (flags {0:#04x})")]
    UnsupportedBuildInfoVersion(u8),

    /// Named section is absent from the image
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// Reading the input failed
    #[error(transparent)]
    Io(#[from] IoError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// Whether this error aborts a whole extraction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::UnrecognizedFormat
                | ScanError::MalformedHeader { .. }
                | ScanError::UnsupportedArchitecture(_)
                | ScanError::Io(_)
        )
    }

    pub(crate) fn malformed(kind: ContainerKind, message: impl Into<String>) -> Self {
        ScanError::MalformedHeader {
            kind,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(IoError::StdIo(err))
    }
}

/// Result type alias for gomodscan operations
pub type Result<T> = std::result::Result<T, ScanError>;

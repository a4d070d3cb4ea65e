//! Error types for `instutils`
//!
//! This module defines all error types used throughout the crate. Detection
//! failures are reported upward as values; only a broken lock protocol is fatal,
//! and that one is raised as a panic (see [`crate::sync`]).
//!
//! Error variants use `#[source]` to preserve error chains for better
//! observability and debugging.

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `instutils`
#[derive(Debug, Error)]
pub enum UtilsError {
    /// The OS information query itself failed
    /// Preserves the underlying error source for full error chain transparency
    #[error("OS version detection failed: {0}")]
    DetectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Not running on the NT platform family and the legacy baseline did not match
    #[error("Unsupported platform: not running on the Windows NT family")]
    UnsupportedPlatform,

    /// A climb reached its component ceiling
    #[error("OS version detection overflowed the {0} ceiling")]
    DetectionOverflow(&'static str),

    /// The critical section was acquired or released out of order
    #[error("Lock protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A host argument could not be interpreted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The host popped from an empty stack
    #[error("Host stack underflow")]
    StackUnderflow,

    /// The host requested a call this crate does not provide
    #[error("Unknown host call: {0}")]
    UnknownCall(String),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl UtilsError {
    /// Shorthand for a [`UtilsError::DetectionFailed`] carrying a plain message
    pub fn detection_failed(msg: impl Into<String>) -> Self {
        Self::DetectionFailed(StringError::new(msg))
    }
}

/// Result type alias for `instutils` operations
pub type Result<T> = std::result::Result<T, UtilsError>;

/// Convert an error to a user-friendly message
///
/// Used as the body of the modal notice shown in verbose mode.
pub fn get_user_friendly_error(error: &UtilsError) -> String {
    match error {
        UtilsError::DetectionFailed(e) => format!(
            "The Windows version could not be determined.\n\n\
             Details: {e}\n\n\
             The installer will treat the version as unknown."
        ),
        UtilsError::UnsupportedPlatform => "This installer requires a Windows NT based system.\n\n\
             The running platform could not be identified as Windows NT."
            .to_string(),
        UtilsError::DetectionOverflow(component) => format!(
            "The Windows {component} exceeded the supported range.\n\n\
             The version could not be determined reliably."
        ),
        UtilsError::ProtocolViolation(what) => format!(
            "Internal locking error: {what}\n\n\
             Please report this problem to the installer author."
        ),
        UtilsError::InvalidArgument(arg) => format!(
            "The installer script passed an invalid argument: {arg}\n\n\
             Please report this problem to the installer author."
        ),
        UtilsError::StackUnderflow => "The installer script passed too few arguments.\n\n\
             Please report this problem to the installer author."
            .to_string(),
        UtilsError::UnknownCall(name) => format!(
            "The installer script requested an unknown function: {name}\n\n\
             The plugin may be older than the script expects."
        ),
        UtilsError::ConfigError(_) => "Failed to load or save configuration.\n\n\
             Check that you have write permissions to:\n\
             %APPDATA%\\instutils"
            .to_string(),
        UtilsError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        UtilsError::JsonError(e) => {
            format!(
                "Configuration file is corrupted:\n\n{e}\n\n\
                 Default settings will be used."
            )
        }
    }
}

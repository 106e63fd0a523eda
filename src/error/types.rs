//! Error types for the admitd daemon.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the daemon.
///
/// Admission denials and token mismatches are deliberately not represented
/// here; they are ordinary return values ([`crate::gate::Decision`] and
/// `bool`). Errors are reserved for conditions that prevent the daemon from
/// being constructed or from serving at all.
#[derive(Error, Debug)]
pub enum AdmitError {
    /// Configuration-related errors. Always fatal at startup.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Secret provisioning errors.
    #[error("Authentication setup error: {kind}")]
    Auth { kind: AuthErrorKind },

    /// Server errors (bind failures and the like).
    #[error("Server error: {message}")]
    Server { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Secret provisioning error kinds.
#[derive(Error, Debug)]
pub enum AuthErrorKind {
    #[error("Secret must not be empty")]
    EmptySecret,

    #[error("Secret file {path} has insecure permissions {mode:04o}, expected 0600 or 0400")]
    InsecureSecretFile { path: PathBuf, mode: u32 },

    #[error("Failed to read secret from {path}: {message}")]
    SecretReadError { path: PathBuf, message: String },
}

/// Result type alias for daemon operations.
pub type AdmitResult<T> = Result<T, AdmitError>;

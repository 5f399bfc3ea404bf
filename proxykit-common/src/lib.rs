//! Common types and utilities shared across proxykit crates.
//!
//! This crate carries the error taxonomy every other crate converts into,
//! the log-safe secret fingerprint helper, and the [`observability`] module
//! that binaries call once at start-up.
//!
//! # Overview
//!
//! - [`ProxyKitError`] and [`Result`]: shared error handling
//! - [`fingerprint`]: short, stable identifier for secrets in log lines
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use proxykit_common::ProxyKitError;
//!
//! let err = ProxyKitError::Validation("username is empty".into());
//! assert!(err.is_user_correctable());
//! assert_eq!(err.to_string(), "Validation error: username is empty");
//! ```

pub mod observability;

/// Length in hex characters of a [`fingerprint`].
pub const FINGERPRINT_LEN: usize = 12;

/// Error categories surfaced to the user interface.
///
/// Nothing here is fatal to the process; the worst outcome of any variant is a
/// feature that silently does not work until the next attempt.
#[derive(thiserror::Error, Debug)]
pub enum ProxyKitError {
    /// Missing or malformed user input (e.g. empty credentials). Blocks the
    /// requested operation entirely.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A host capability (such as containers) is missing; the feature is disabled.
    #[error("Host capability unavailable: {0}")]
    HostCapabilityUnavailable(String),

    /// IP or location lookup failed; callers degrade to placeholder text.
    #[error("Network lookup failed: {0}")]
    NetworkLookup(String),

    /// Storage read or write failed; the operation is aborted without retry.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else (closed channels, panicked tasks).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyKitError {
    /// Whether the user can fix this by changing their input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, ProxyKitError::Validation(_))
    }
}

impl From<anyhow::Error> for ProxyKitError {
    fn from(err: anyhow::Error) -> Self {
        ProxyKitError::Internal(format!("{err:#}"))
    }
}

/// Convenient alias for results that use [`ProxyKitError`].
pub type Result<T> = std::result::Result<T, ProxyKitError>;

/// Short BLAKE3 fingerprint of a secret-ish value, safe to put in logs.
///
/// ```
/// let a = proxykit_common::fingerprint("alice");
/// assert_eq!(a.len(), proxykit_common::FINGERPRINT_LEN);
/// assert_eq!(a, proxykit_common::fingerprint("alice"));
/// assert_ne!(a, proxykit_common::fingerprint("bob"));
/// ```
pub fn fingerprint(value: &str) -> String {
    let digest = blake3::hash(value.as_bytes());
    let mut hexed = hex::encode(digest.as_bytes());
    hexed.truncate(FINGERPRINT_LEN);
    hexed
}

//! Error Module
//!
//! Error types shared by the verification and catalog services.
//! Not-found conditions are never errors here: they are `Option::None`.

use thiserror::Error;

/// Caller-supplied input that cannot be turned into a backend request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A timestamp field was supplied but is not valid ISO-8601
    #[error("invalid {field} '{value}': expected an ISO-8601 timestamp")]
    InvalidTimestamp { field: &'static str, value: String },

    /// Only one bound of a time range was supplied while strict ranges are enabled
    #[error("incomplete time range: {present} was given without {missing}")]
    IncompleteTimeRange {
        present: &'static str,
        missing: &'static str,
    },
}

/// Failures surfaced by the ledger backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// RPC transport failure (connection refused, timeout, bad status)
    #[error("transport error: {0}")]
    Transport(String),

    /// The ledger rejected or could not answer the query
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Object storage holding raw batch payloads failed
    #[error("storage error: {0}")]
    Storage(String),

    /// The backend refused an argument (e.g. an unknown ordering)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Any failure that can occur inside a public operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Result type for service internals
pub type Result<T> = std::result::Result<T, AuditError>;

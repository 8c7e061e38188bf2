//! Error types for uptrace-core.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using uptrace-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for monitor reconciliation
#[derive(Error, Debug)]
pub enum Error {
    // Pre-flight errors
    #[error("Invalid plan: {0}")]
    Validation(String),

    // Transport errors
    #[error("Monitor not found: {0}")]
    NotFound(String),

    #[error("Uptrace returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operation cancelled before the remote call completed")]
    Cancelled,

    /// The monitor exists remotely but reading it back failed.
    #[error("Monitor {id} was created but could not be read back: {reason}")]
    Unconfirmed { id: u64, reason: String },

    // Payload errors
    #[error("Failed to decode Uptrace response: {0}")]
    Decode(String),

    #[error("Projection error: {0}")]
    Projection(String),

    // Client construction
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a projection error
    pub fn projection(message: impl Into<String>) -> Self {
        Self::Projection(message.into())
    }

    /// Classify the error for diagnostics.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Config(_) => ErrorKind::ValidationFailure,
            Error::NotFound(_)
            | Error::Status { .. }
            | Error::Transport(_)
            | Error::Cancelled
            | Error::Unconfirmed { .. } => ErrorKind::TransportFailure,
            Error::Decode(_) => ErrorKind::DecodeFailure,
            Error::Projection(_) => ErrorKind::ProjectionFailure,
        }
    }

    /// Id of a monitor that was created even though the operation failed.
    pub fn created_id(&self) -> Option<u64> {
        match self {
            Error::Unconfirmed { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Whether the remote service reported the monitor as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Failure classes surfaced to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Plan violates an invariant; no network call was made.
    ValidationFailure,
    /// Network, HTTP status, not-found or cancellation.
    TransportFailure,
    /// Response did not match the monitor shape.
    DecodeFailure,
    /// A value could not be carried between the two models.
    ProjectionFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ValidationFailure => "validation failure",
            ErrorKind::TransportFailure => "transport failure",
            ErrorKind::DecodeFailure => "decode failure",
            ErrorKind::ProjectionFailure => "projection failure",
        };
        f.write_str(s)
    }
}

/// A structured, user-visible failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Build a diagnostic for a failed operation.
    pub fn from_error(summary: impl Into<String>, error: &Error) -> Self {
        Self::new(error.kind(), summary, error.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.summary, self.kind, self.detail)
    }
}

/// Ordered collection of diagnostics from one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn add_error(&mut self, summary: impl Into<String>, error: &Error) {
        self.push(Diagnostic::from_error(summary, error));
    }

    pub fn has_error(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(d: Diagnostic) -> Self {
        Self(vec![d])
    }
}

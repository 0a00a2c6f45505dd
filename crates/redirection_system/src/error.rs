//! Error types for the redirection system.

use thiserror::Error;

/// Errors raised while dispatching a redirected call.
///
/// A lookup miss is never an error (it resolves through the fallback), and a
/// type that cannot be synthesized is reported as
/// [`Synthesized::Absent`](crate::Synthesized::Absent) instead. What remains
/// here are failures coming from replacement logic or from a malformed call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedirectionError {
    /// The default fallback: the original behavior is not available headlessly
    #[error("Unsupported operation: {descriptor}")]
    Unsupported { descriptor: String },
    /// A registered handler failed
    #[error("Redirection handler failed for {descriptor}: {reason}")]
    HandlerFailed { descriptor: String, reason: String },
    /// A proxy was asked for a method its interface does not declare
    #[error("No method {method} on interface {interface}")]
    NoSuchMethod { interface: String, method: String },
    /// A proxy call carried the wrong number of arguments
    #[error("Method {descriptor} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        descriptor: String,
        expected: usize,
        actual: usize,
    },
    /// Only interfaces can be proxied
    #[error("Cannot proxy {class}: not an interface")]
    NotAnInterface { class: String },
    /// The registry backing a proxy has been dropped
    #[error("Redirection registry is no longer available")]
    RegistryUnavailable,
}

impl RedirectionError {
    /// Builds a [`RedirectionError::HandlerFailed`] for `descriptor`.
    pub fn handler_failed(descriptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HandlerFailed {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }

    /// Builds a [`RedirectionError::Unsupported`] for `descriptor`.
    pub fn unsupported(descriptor: impl Into<String>) -> Self {
        Self::Unsupported {
            descriptor: descriptor.into(),
        }
    }
}

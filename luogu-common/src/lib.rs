//! Common types shared across the Luogu normalization crates.
//!
//! This crate defines the single error kind raised when a response cannot be
//! interpreted, the diagnostics capability the extractors report through, and
//! the tracing/logging initialiser used by binaries and integration tests.
//!
//! # Overview
//!
//! - [`StructureError`] and [`Result`]: shared error handling
//! - [`diagnostics`]: the injected debug/warn/error sink
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use luogu_common::StructureError;
//!
//! let err = StructureError::new("article markup malformed", "Luogu API");
//! assert_eq!(err.to_string(), "Luogu API: article markup malformed");
//! assert!(std::error::Error::source(&err).is_none());
//! ```
use std::error::Error as StdError;

pub mod diagnostics;
pub mod observability;

/// Upstream label attached to errors when no configuration overrides it.
pub const DEFAULT_SERVICE_LABEL: &str = "Luogu API";

type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// A response could not be interpreted under the requested kind.
///
/// Carries a human-readable message, the label of the upstream service the
/// response came from, and optionally the decode error that triggered it.
#[derive(thiserror::Error, Debug)]
#[error("{service}: {message}")]
pub struct StructureError {
    message: String,
    service: String,
    #[source]
    cause: Option<BoxedCause>,
}

impl StructureError {
    pub fn new(message: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            service: service.into(),
            cause: None,
        }
    }

    /// Attach the underlying error; its text is appended to the message.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.message = format!("{}: {}", self.message, cause);
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

/// Convenient alias for results that use [`StructureError`].
pub type Result<T> = std::result::Result<T, StructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_is_exposed_as_source() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StructureError::new("bad marker", DEFAULT_SERVICE_LABEL).with_cause(decode);

        assert!(err.message().starts_with("bad marker: "));
        assert_eq!(err.service(), "Luogu API");
        assert!(StdError::source(&err).is_some());
    }
}

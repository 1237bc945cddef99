//! Validation error types for the container-spec compiler.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Category of a single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// A delimited string field does not match its expected pattern.
    MalformedFormat,
    /// A memory or CPU limit could not be normalized.
    InvalidResourceLimit,
    /// A capability is not in the known-capability table.
    UnknownCapability,
    /// A security option does not start with an allowed prefix.
    InvalidSecurityOption,
    /// The request asks to run as root.
    ProhibitedRootUser,
    /// A device mapping targets a blacklisted host device.
    DangerousDevice,
    /// An environment variable key is not a valid identifier.
    InvalidEnvironmentKey,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MalformedFormat => "malformed format",
            Self::InvalidResourceLimit => "invalid resource limit",
            Self::UnknownCapability => "unknown capability",
            Self::InvalidSecurityOption => "invalid security option",
            Self::ProhibitedRootUser => "prohibited root user",
            Self::DangerousDevice => "dangerous device",
            Self::InvalidEnvironmentKey => "invalid environment key",
        };
        write!(f, "{s}")
    }
}

/// A single rejected input, naming the offending field and why.
///
/// Validation errors are data outcomes, never fatal: the compiler collects
/// every independently-detectable one so a caller can fix all problems in a
/// single round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {reason} ({kind})")]
pub struct ValidationError {
    /// Request field the error applies to (e.g. `ports[1]`).
    pub field: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable explanation including the expected pattern.
    pub reason: String,
}

impl ValidationError {
    /// Build an error for `field` with the given kind and reason.
    pub fn new(field: impl Into<String>, kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            reason: reason.into(),
        }
    }

    /// Return a copy of this error reported against a different field.
    ///
    /// Parsers name the field they were told about; the compiler re-attaches
    /// list indices (`devices[2]`) before accumulating.
    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

/// Ordered, non-empty list of validation errors from one compile pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    /// Wrap a non-empty error list.
    ///
    /// Returns `None` when the list is empty: a request yields either a spec
    /// or at least one error, never an empty failure.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// The individual errors, in the order fields were validated.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Number of collected errors (always >= 1).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s): ", self.0.len())?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

//! Domain error types for the cache restore step.

use color_eyre::Report;
use thiserror::Error;

/// Result alias for operations that may return a [`CacheRestoreError`].
pub type Result<T> = std::result::Result<T, CacheRestoreError>;

/// Result alias for input parsing.
pub type InputResult<T> = std::result::Result<T, InputError>;

/// Result alias for cache-store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result alias for configuration fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for job-channel writes.
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

/// Top-level error exposed by the crate.
///
/// Every variant represents a fatal classification: the job fails with the
/// variant's message.
#[derive(Debug, Error)]
pub enum CacheRestoreError {
    /// A required input was missing or malformed.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The cache store rejected or failed the restore.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No cache entry matched and the cache was declared required.
    #[error("{message}")]
    CacheNotFound {
        /// Human-readable message listing the keys that were tried.
        message: String,
    },
    /// Configuration could not be loaded.
    #[error("configuration parsing failed")]
    Config(#[from] ConfigError),
}

/// Captures missing or malformed action inputs.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum InputError {
    /// A required input was absent or empty after trimming.
    #[error("Input required and not supplied: {name}")]
    Missing {
        /// Name of the input as declared by the action.
        name: String,
    },
    /// A boolean input held a value outside the YAML 1.2 core schema.
    #[error(
        "Input does not meet YAML 1.2 \"Core Schema\" specification: {name}\n\
         Support boolean input list: `true | True | TRUE | false | False | FALSE`"
    )]
    InvalidBoolean {
        /// Name of the input as declared by the action.
        name: String,
    },
}

/// Categorises cache-store failures so the orchestrator can apply policy
/// without inspecting messages.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum StoreErrorKind {
    /// Malformed key or path input. Never suppressed.
    Validation,
    /// Storage or network fault that may succeed on a later run.
    #[default]
    Transient,
}

/// Captures cache-store failures.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct StoreError {
    kind: StoreErrorKind,
    #[source]
    report: Report,
}

impl StoreError {
    /// Constructs a new store error with the provided kind and diagnostic
    /// report.
    #[must_use]
    pub const fn new(kind: StoreErrorKind, report: Report) -> Self {
        Self { kind, report }
    }

    /// Builds a validation error from a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Validation, Report::msg(message.into()))
    }

    /// Builds a transient error from a message.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transient, Report::msg(message.into()))
    }

    /// Returns the semantic category for this store failure.
    #[must_use]
    pub const fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Reports whether the failure stems from invalid caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind == StoreErrorKind::Validation
    }

    /// Extracts the underlying diagnostic report.
    pub fn into_report(self) -> Report {
        self.report
    }
}

impl From<Report> for StoreError {
    fn from(report: Report) -> Self {
        Self::new(StoreErrorKind::Transient, report)
    }
}

/// Captures configuration failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);

/// Captures failures writing outputs or state for later steps.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ChannelError(#[from] Report);

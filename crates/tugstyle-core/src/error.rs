//! Error types and error code constants for tugstyle.
//!
//! Each layer has its own error enum:
//! - [`SolutionError`]: snapshot lookups (unknown document/project)
//! - [`ServiceError`]: failures reported by language services (resolution, rename)
//! - [`EngineError`]: failures of the rename protocol itself
//! - [`ConfigError`]: configuration loading
//!
//! [`StyleError`] is the unified type the CLI renders, and [`OutputErrorCode`]
//! provides the stable exit codes.
//!
//! ## Exit Codes
//!
//! - `2`: Invalid arguments or configuration
//! - `3`: Resolution errors (a candidate did not resolve)
//! - `4`: Apply errors (writing results)
//! - `5`: Rename rejected by the rename service (invalid name, conflict)
//! - `6`: Unsupported language for a rule
//! - `7`: Cancelled
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;
use std::io;

use thiserror::Error;

use crate::engine::RuleId;
use crate::solution::{DocumentId, Language, ProjectId, Solution};
use crate::types::Location;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments or configuration.
    InvalidArguments = 2,
    /// A candidate did not resolve to a symbol.
    ResolutionError = 3,
    /// Failed to write results.
    ApplyError = 4,
    /// The rename service rejected a rename.
    RenameRejected = 5,
    /// No engine for the document's language.
    Unsupported = 6,
    /// The operation was cancelled.
    Cancelled = 7,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Layer Errors
// ============================================================================

/// Errors from snapshot lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolutionError {
    #[error("document {document} not found in solution")]
    DocumentNotFound { document: DocumentId },

    #[error("project {project} not found in solution")]
    ProjectNotFound { project: ProjectId },
}

/// Errors reported by language services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested name is not a valid identifier.
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// The symbol is defined outside the solution and cannot be renamed.
    #[error("cannot rename '{name}': symbol is defined outside the solution")]
    MetadataSymbol { name: String },

    /// A renamed reference no longer binds to the renamed symbol.
    #[error("renaming '{old_name}' to '{new_name}' conflicts at {location}")]
    Conflict {
        old_name: String,
        new_name: String,
        location: Location,
    },

    /// The cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Solution(#[from] SolutionError),
}

/// Errors from the rename engine and dispatcher.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No engine is registered for the document's language.
    #[error("rule '{rule}' is not supported for {language}")]
    Unsupported { rule: RuleId, language: Language },

    /// A marked candidate resolved to no symbol.
    #[error("candidate {index} in {document} did not resolve to a symbol")]
    SymbolNotResolved { document: DocumentId, index: usize },

    /// Fewer marked nodes than scanned candidates.
    #[error("candidate {index} in {document} is missing: {found} marked node(s) remain")]
    MarkerMissing {
        document: DocumentId,
        index: usize,
        found: usize,
    },

    /// The candidate's path no longer exists in the current tree.
    #[error("candidate {index} in {document} could not be rewritten")]
    RewriteFailed { document: DocumentId, index: usize },

    /// Cancelled between iterations; `committed` is the last complete snapshot.
    #[error("rename cancelled after {completed} of {total} candidate(s)")]
    Cancelled {
        completed: usize,
        total: usize,
        committed: Box<Solution>,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Solution(#[from] SolutionError),
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid config {path}: {message}")]
    Parse { path: String, message: String },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum StyleError {
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("unsupported: {message}")]
    Unsupported { message: String },

    #[error("resolution error: {message}")]
    Resolution { message: String },

    #[error("rename rejected: {message}")]
    RenameRejected { message: String },

    #[error("apply error: {message}")]
    Apply {
        message: String,
        file: Option<String>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<&StyleError> for OutputErrorCode {
    fn from(err: &StyleError) -> Self {
        match err {
            StyleError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            StyleError::InvalidConfig { .. } => OutputErrorCode::InvalidArguments,
            StyleError::Unsupported { .. } => OutputErrorCode::Unsupported,
            StyleError::Resolution { .. } => OutputErrorCode::ResolutionError,
            StyleError::RenameRejected { .. } => OutputErrorCode::RenameRejected,
            StyleError::Apply { .. } => OutputErrorCode::ApplyError,
            StyleError::Cancelled => OutputErrorCode::Cancelled,
            StyleError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl StyleError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        StyleError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        StyleError::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<ServiceError> for StyleError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Cancelled => StyleError::Cancelled,
            ServiceError::Solution(inner) => StyleError::internal(inner.to_string()),
            other => StyleError::RenameRejected {
                message: other.to_string(),
            },
        }
    }
}

impl From<EngineError> for StyleError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unsupported { .. } => StyleError::Unsupported {
                message: err.to_string(),
            },
            EngineError::SymbolNotResolved { .. } => StyleError::Resolution {
                message: err.to_string(),
            },
            EngineError::MarkerMissing { .. } | EngineError::RewriteFailed { .. } => {
                StyleError::internal(err.to_string())
            }
            EngineError::Cancelled { .. } => StyleError::Cancelled,
            EngineError::Service(inner) => StyleError::from(inner),
            EngineError::Solution(inner) => StyleError::internal(inner.to_string()),
        }
    }
}

impl From<ConfigError> for StyleError {
    fn from(err: ConfigError) -> Self {
        StyleError::InvalidConfig {
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for StyleError {
    fn from(err: io::Error) -> Self {
        StyleError::internal(format!("IO error: {}", err))
    }
}

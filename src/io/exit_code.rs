//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed, results found (or no results is acceptable)
//! - `1`: General error - unspecified failure
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::SearchError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// No persisted index / no results (code 3)
    NotFound = 3,

    /// Caller-side input error, e.g. an empty query (code 4)
    InvalidRequest = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Index corruption detected (code 7)
    IndexCorrupted = 7,

    /// An external collaborator (store or embedder) failed (code 8)
    UpstreamUnavailable = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<&SearchError> for ExitCode {
    fn from(err: &SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => Self::InvalidRequest,
            SearchError::IndexNotReady | SearchError::NotFound { .. } => Self::NotFound,
            SearchError::Corrupt { .. } | SearchError::ModelMismatch { .. } => {
                Self::IndexCorrupted
            }
            SearchError::SourceUnavailable { .. }
            | SearchError::EmbedderUnavailable { .. } => Self::UpstreamUnavailable,
            SearchError::Persistence { .. } => Self::IoError,
            SearchError::Config { .. } => Self::ConfigError,
            _ => Self::GeneralError,
        }
    }
}

impl ExitCode {
    /// Terminate the process with this code.
    pub fn exit(self) -> ! {
        std::process::exit(self.into())
    }
}

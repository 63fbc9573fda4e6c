//! Input/Output handling for the CLI.
//!
//! Unified output formatting (text, JSON) and consistent exit codes, so
//! the binary composes with scripts and automation.

pub mod exit_code;
pub mod format;

pub use exit_code::ExitCode;
pub use format::{JsonResponse, OutputFormat};

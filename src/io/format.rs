//! Format definitions for CLI output.
//!
//! Provides structured format types for consistent JSON responses so the
//! binary composes with scripts and tool integration.

use crate::error::SearchError;
use crate::io::exit_code::ExitCode;
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// JSON for tool integration
    Json,
}

impl OutputFormat {
    /// Create format from JSON flag.
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    /// Check if format is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Standard JSON response envelope for CLI commands.
#[derive(Debug, Serialize)]
pub struct JsonResponse<T>
where
    T: Serialize,
{
    /// Status: "success" or "error"
    pub status: String,

    /// Result code (e.g., "OK", "INDEX_NOT_READY")
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Actual data payload (only for success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Recovery suggestions (only for errors)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<&'static str>,

    /// Exit code for shell scripts
    pub exit_code: u8,
}

impl<T> JsonResponse<T>
where
    T: Serialize,
{
    /// Create a success response with data.
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            code: "OK".to_string(),
            message: "Operation completed successfully".to_string(),
            data: Some(data),
            suggestions: Vec::new(),
            exit_code: ExitCode::Success as u8,
        }
    }

    /// Create an error response from a search error.
    pub fn error(err: &SearchError) -> Self {
        Self {
            status: "error".to_string(),
            code: err.status_code().to_string(),
            message: err.to_string(),
            data: None,
            suggestions: err.recovery_suggestions(),
            exit_code: ExitCode::from(err) as u8,
        }
    }

    /// Print the response to stdout as pretty JSON.
    pub fn print(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize response: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flag() {
        assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Text);
        assert!(OutputFormat::Json.is_json());
        assert!(!OutputFormat::Text.is_json());
    }

    #[test]
    fn test_success_response_shape() {
        let response = JsonResponse::success(vec!["a", "b"]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["code"], "OK");
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["data"][1], "b");
    }

    #[test]
    fn test_error_response_carries_code_and_suggestions() {
        let err = SearchError::IndexNotReady;
        let response: JsonResponse<()> = JsonResponse::error(&err);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "INDEX_NOT_READY");
        assert_eq!(json["exit_code"], 3);
        assert!(!json["suggestions"].as_array().unwrap().is_empty());
    }
}

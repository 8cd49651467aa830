//! Error types for ryt-cipher

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Main error type for ryt-cipher operations
#[derive(Debug, Error)]
pub enum RytError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Player script URL not found in page")]
    PlayerScriptNotFound,

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] reqwest::Error),

    #[error("Cached algorithm for {script} conflicts with a fresh extraction")]
    CacheConflict { script: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl RytError {
    /// Check if error is worth retrying at the transport level
    pub fn is_retryable(&self) -> bool {
        match self {
            RytError::FetchFailed(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            RytError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Stage of the cipher extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStage {
    FunctionName,
    FunctionBody,
    HelperName,
    HelperBody,
    HelperInvalid,
    HelperMethods,
    Translate,
}

impl ExtractionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStage::FunctionName => "function-name",
            ExtractionStage::FunctionBody => "function-body",
            ExtractionStage::HelperName => "helper-name",
            ExtractionStage::HelperBody => "helper-body",
            ExtractionStage::HelperInvalid => "helper-invalid",
            ExtractionStage::HelperMethods => "helper-methods",
            ExtractionStage::Translate => "translate",
        }
    }
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExtractionStage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A player script could not be reduced to an operation sequence.
///
/// `attempted` names every heuristic that was tried at the failing stage, in
/// the order they were tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cipher extraction failed at stage `{stage}` (tried: {})", .attempted.join(", "))]
pub struct ExtractionError {
    pub stage: ExtractionStage,
    pub attempted: Vec<&'static str>,
}

impl ExtractionError {
    pub fn new(stage: ExtractionStage, attempted: Vec<&'static str>) -> Self {
        Self { stage, attempted }
    }
}

/// A single format descriptor could not be turned into a stream URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("cipher descriptor is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("format has neither a url nor a signatureCipher")]
    NoStreamSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_display() {
        let err = ExtractionError::new(
            ExtractionStage::FunctionName,
            vec!["signature-call-site", "split-join-declaration"],
        );
        assert_eq!(
            err.to_string(),
            "cipher extraction failed at stage `function-name` (tried: signature-call-site, split-join-declaration)"
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(ExtractionStage::HelperInvalid.as_str(), "helper-invalid");
        assert_eq!(ExtractionStage::Translate.to_string(), "translate");
    }

    #[test]
    fn test_is_retryable() {
        let server_error = RytError::HttpStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        let not_found = RytError::HttpStatus {
            status: 404,
            url: "https://example.com".to_string(),
        };
        assert!(server_error.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(!RytError::PlayerScriptNotFound.is_retryable());
        assert!(!RytError::from(ParseError::MissingField("s")).is_retryable());
    }

    #[test]
    fn test_transparent_wrapping() {
        let err: RytError = ParseError::MissingField("url").into();
        assert_eq!(
            err.to_string(),
            "cipher descriptor is missing required field `url`"
        );
    }
}

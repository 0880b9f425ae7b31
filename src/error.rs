//! Structured error types for the carterie pipeline.
//!
//! Only hard failures live here. Missing fonts and missing photos are
//! render-time soft failures: they are logged and absorbed where they occur,
//! and never surface as a `CardError`.

use thiserror::Error;

/// The unified error type returned by all public carterie API functions.
#[derive(Debug, Error)]
pub enum CardError {
    /// Card parameter JSON failed to parse.
    #[error("failed to parse card parameters: {source} ({hint})")]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// An image could not be read, decoded, or encoded.
    #[error("image error: {0}")]
    Image(String),

    /// Sheet layout preconditions were not met: an empty source directory,
    /// or a photo too large for the page at the requested margin.
    #[error("sheet error: {0}")]
    Sheet(String),

    /// Filesystem failure outside the soft-failure paths.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CardError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "check for trailing commas, missing quotes, or unescaped characters"
            }
            serde_json::error::Category::Data => {
                "the JSON is valid but doesn't match the card parameter schema; check field names and types"
            }
            serde_json::error::Category::Eof => "unexpected end of input — is the JSON truncated?",
            serde_json::error::Category::Io => "the parameter blob could not be read",
        };
        CardError::Parse {
            source: e,
            hint: hint.to_string(),
        }
    }
}

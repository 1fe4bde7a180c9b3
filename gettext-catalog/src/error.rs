//! All error types for the gettext-catalog crate.
//!
//! Errors only come out of decoding, rule compilation and file access.
//! Message lookups on a built [`crate::Catalog`] never fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid plural rule `{expression}` at offset {position}: {message}")]
    RuleSyntax {
        expression: String,
        position: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing language: {0}")]
    MissingLanguage(String),
}

impl Error {
    /// Creates a new decode error for malformed catalog bytes.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }

    /// Creates a new plural rule syntax error.
    pub fn rule_syntax(
        expression: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Error::RuleSyntax {
            expression: expression.into(),
            position,
            message: message.into(),
        }
    }

    /// Returns `true` when the input bytes were not a well-formed catalog.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::Json(_))
    }
}

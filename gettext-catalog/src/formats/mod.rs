//! All supported catalog file formats for gettext-catalog.
//!
//! This module re-exports the main types for each format and provides
//! the [`FormatType`] enum for generic format handling across the crate.

pub mod json;
pub mod mo;
pub mod po;

use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
    str::FromStr,
};

use encoding_rs::{Encoding, UTF_8};

// Reexporting the formats for easier access
pub use json::Format as JsonFormat;
pub use mo::Format as MoFormat;
pub use po::Format as PoFormat;

use crate::{Error, types::Header};

/// Represents all supported catalog file formats for generic handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatType {
    /// Compiled binary gettext catalog (`.mo`).
    Mo,
    /// Text gettext catalog (`.po`, `.pot`).
    Po,
    /// JSON array of messages, with the language it is written in.
    /// JSON carries no header, so the language has to come from outside.
    Json(Option<String>),
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// # Example
/// ```rust
/// use gettext_catalog::formats::FormatType;
/// assert_eq!(FormatType::Mo.to_string(), "mo");
/// assert_eq!(FormatType::Po.to_string(), "po");
/// assert_eq!(FormatType::Json(Some("es".into())).to_string(), "json");
/// ```
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Mo => write!(f, "mo"),
            FormatType::Po => write!(f, "po"),
            FormatType::Json(_) => write!(f, "json"),
        }
    }
}

/// Implements [`std::str::FromStr`] for [`FormatType`].
///
/// Accepts `mo`, `gmo`, `po`, `pot` and `json`, case-insensitively.
///
/// # Example
/// ```rust
/// use gettext_catalog::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("MO").unwrap(), FormatType::Mo);
/// assert_eq!(FormatType::from_str("pot").unwrap(), FormatType::Po);
/// assert!(FormatType::from_str("xliff").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "mo" | "gmo" => Ok(FormatType::Mo),
            "po" | "pot" => Ok(FormatType::Po),
            "json" => Ok(FormatType::Json(None)),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Mo => "mo",
            FormatType::Po => "po",
            FormatType::Json(_) => "json",
        }
    }

    /// Returns the language attached to this format, if any.
    pub fn language(&self) -> Option<&String> {
        match self {
            FormatType::Json(lang) => lang.as_ref(),
            FormatType::Mo | FormatType::Po => None,
        }
    }

    /// Returns a copy with the language replaced. Only JSON carries one.
    pub fn with_language(&self, lang: Option<String>) -> Self {
        match self {
            FormatType::Json(_) => FormatType::Json(lang),
            other => other.clone(),
        }
    }
}

/// Picks the encoding for a `charset=` label. Missing or unknown labels
/// fall back to UTF-8.
pub(crate) fn encoding_for_label(label: Option<&str>) -> &'static Encoding {
    let Some(label) = label else {
        return UTF_8;
    };
    match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding,
        None => {
            // `CHARSET` is the placeholder xgettext leaves in templates.
            if !label.eq_ignore_ascii_case("CHARSET") {
                tracing::warn!(charset = label, "unknown charset, decoding as UTF-8");
            }
            UTF_8
        }
    }
}

/// Decodes bytes strictly: malformed sequences are an error, not U+FFFD.
pub(crate) fn decode_bytes(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, Error> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| Error::decode(format!("invalid {} byte sequence", encoding.name())))
}

/// Encoders always write UTF-8, so the written header has to say so.
pub(crate) fn utf8_header(header: &Header) -> Header {
    let mut header = header.clone();
    let foreign = header
        .charset()
        .is_some_and(|charset| !charset.eq_ignore_ascii_case("UTF-8"));
    if foreign {
        header.set(Header::CONTENT_TYPE, "text/plain; charset=UTF-8");
    }
    header
}

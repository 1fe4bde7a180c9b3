//! Options controlling how catalog files are read into a `Resource` or `Catalog`.

/// Read behavior options for [`crate::Catalog::open`] and the [`crate::codec`] helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Language used when the file itself does not declare one. Required for
    /// JSON catalogs whose language cannot be inferred from the path.
    pub language_hint: Option<String>,
    /// Whether PO entries flagged `fuzzy` are loaded. Defaults to `true`.
    pub include_fuzzy: bool,
    /// Rejects catalogs whose plural rule would fall back to the
    /// unknown-language default.
    pub strict: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            language_hint: None,
            include_fuzzy: true,
            strict: false,
        }
    }
}

impl ReadOptions {
    /// Creates default read options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a language hint.
    pub fn with_language_hint(mut self, language_hint: Option<String>) -> Self {
        self.language_hint = language_hint;
        self
    }

    /// Includes or skips fuzzy PO entries.
    pub fn with_fuzzy(mut self, include_fuzzy: bool) -> Self {
        self.include_fuzzy = include_fuzzy;
        self
    }

    /// Enables/disables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

//! Core, format-agnostic types for gettext-catalog.
//! Decoders produce these; encoders and the catalog consume them.

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::plural::PluralSource;

lazy_static! {
    static ref CHARSET_REGEX: Regex = Regex::new(r"(?i)charset\s*=\s*([A-Za-z0-9_\-.:]+)").unwrap();
}

/// One translatable unit of a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    /// Disambiguating context (`msgctxt`). Empty means "no context".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,

    /// Source-language singular string (`msgid`).
    pub id: String,

    /// Source-language plural string (`msgid_plural`). Empty when the
    /// message has no plural form.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id_plural: String,

    /// Singular translation. Empty means untranslated.
    #[serde(default)]
    pub translation: String,

    /// One translation per plural form index of the catalog's language.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plural_translations: Vec<String>,
}

impl Message {
    /// Creates a singular message.
    pub fn new(context: &str, id: &str, translation: &str) -> Self {
        Self {
            context: context.to_string(),
            id: id.to_string(),
            translation: translation.to_string(),
            ..Default::default()
        }
    }

    /// Creates a plural message. The singular translation is the first form.
    pub fn plural(context: &str, id: &str, id_plural: &str, forms: &[&str]) -> Self {
        Self {
            context: context.to_string(),
            id: id.to_string(),
            id_plural: id_plural.to_string(),
            translation: forms.first().map(|s| s.to_string()).unwrap_or_default(),
            plural_translations: forms.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The composite lookup key of this message.
    pub fn key(&self) -> MessageKey {
        MessageKey::new(&self.context, &self.id)
    }

    /// Whether this message declares a plural source string.
    pub fn is_plural(&self) -> bool {
        !self.id_plural.is_empty()
    }

    /// Whether any translated string is present.
    pub fn is_translated(&self) -> bool {
        !self.translation.is_empty() || self.plural_translations.iter().any(|s| !s.is_empty())
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.context.is_empty() {
            write!(f, "Message {{ id: {}, translation: {} }}", self.id, self.translation)
        } else {
            write!(
                f,
                "Message {{ context: {}, id: {}, translation: {} }}",
                self.context, self.id, self.translation
            )
        }
    }
}

/// Composite `(context, id)` key of a message inside a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct MessageKey {
    pub context: String,
    pub id: String,
}

impl MessageKey {
    pub fn new(context: &str, id: &str) -> Self {
        Self {
            context: context.to_string(),
            id: id.to_string(),
        }
    }
}

impl Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}|{}", self.context, self.id)
        }
    }
}

/// The MIME header of a catalog, stored as the translation of the empty msgid.
///
/// Field order is preserved so that re-encoding yields the same header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Header {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<(String, String)>,
}

impl Header {
    pub const LANGUAGE: &'static str = "Language";
    pub const PLURAL_FORMS: &'static str = "Plural-Forms";
    pub const CONTENT_TYPE: &'static str = "Content-Type";

    /// Parses `Key: Value` lines. Lines without a colon are ignored.
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), value.trim().to_string()))
            })
            .collect();
        Header { fields }
    }

    /// Case-insensitive field lookup. Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Replaces an existing field or appends a new one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(field) => field.1 = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn language(&self) -> Option<&str> {
        self.get(Self::LANGUAGE)
    }

    pub fn plural_forms(&self) -> Option<&str> {
        self.get(Self::PLURAL_FORMS)
    }

    /// The `charset=` parameter of `Content-Type`, if declared.
    pub fn charset(&self) -> Option<&str> {
        let content_type = self.get(Self::CONTENT_TYPE)?;
        CHARSET_REGEX
            .captures(content_type)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Picks the plural source: `Plural-Forms` first, then `Language`,
    /// then the supplied hint.
    pub fn plural_source(&self, language_hint: Option<&str>) -> PluralSource {
        if let Some(forms) = self.plural_forms() {
            PluralSource::Expression(forms.to_string())
        } else if let Some(language) = self.language().or(language_hint) {
            PluralSource::Language(language.to_string())
        } else {
            PluralSource::Unknown
        }
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.fields {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// A decoded catalog file: its header and all messages in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resource {
    #[serde(default)]
    pub header: Header,

    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Resource {
    pub fn new(header: Header, messages: Vec<Message>) -> Self {
        Self { header, messages }
    }

    pub fn language(&self) -> Option<&str> {
        self.header.language()
    }

    /// Finds the first message with the given key, in file order.
    pub fn find_message(&self, context: &str, id: &str) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.context == context && m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse_and_accessors() {
        let header = Header::parse(
            "Project-Id-Version: demo 1.0\n\
             Language: pt_BR\n\
             Content-Type: text/plain; charset=ISO-8859-1\n\
             Plural-Forms: nplurals=2; plural=(n > 1);\n",
        );
        assert_eq!(header.fields.len(), 4);
        assert_eq!(header.language(), Some("pt_BR"));
        assert_eq!(header.charset(), Some("ISO-8859-1"));
        assert_eq!(header.plural_forms(), Some("nplurals=2; plural=(n > 1);"));
        assert_eq!(header.get("project-id-version"), Some("demo 1.0"));
    }

    #[test]
    fn test_header_empty_value_is_absent() {
        let header = Header::parse("Language: \nPlural-Forms:\n");
        assert_eq!(header.language(), None);
        assert_eq!(header.plural_forms(), None);
        assert_eq!(header.plural_source(Some("de")), PluralSource::Language("de".into()));
    }

    #[test]
    fn test_header_plural_source_priority() {
        let mut header = Header::default();
        assert_eq!(header.plural_source(None), PluralSource::Unknown);

        header.set("Language", "fr");
        assert_eq!(header.plural_source(Some("de")), PluralSource::Language("fr".into()));

        header.set("Plural-Forms", "nplurals=1; plural=0;");
        assert_eq!(
            header.plural_source(Some("de")),
            PluralSource::Expression("nplurals=1; plural=0;".into())
        );
    }

    #[test]
    fn test_header_display_roundtrip() {
        let text = "Language: ru\nPlural-Forms: nplurals=3; plural=n%10==1 ? 0 : 1;\n";
        let header = Header::parse(text);
        assert_eq!(header.to_string(), text);
        assert_eq!(Header::parse(&header.to_string()), header);
    }

    #[test]
    fn test_message_constructors() {
        let singular = Message::new("menu", "Open", "Abrir");
        assert_eq!(singular.key(), MessageKey::new("menu", "Open"));
        assert!(!singular.is_plural());
        assert!(singular.is_translated());

        let plural = Message::plural("", "file", "files", &["fichier", "fichiers"]);
        assert!(plural.is_plural());
        assert_eq!(plural.translation, "fichier");
        assert_eq!(plural.plural_translations.len(), 2);

        assert!(!Message::new("", "untranslated", "").is_translated());
    }

    #[test]
    fn test_message_key_display() {
        assert_eq!(MessageKey::new("", "Open").to_string(), "Open");
        assert_eq!(MessageKey::new("menu", "Open").to_string(), "menu|Open");
    }

    #[test]
    fn test_resource_find_message() {
        let resource = Resource::new(
            Header::default(),
            vec![Message::new("a", "x", "1"), Message::new("", "x", "2")],
        );
        assert_eq!(resource.find_message("", "x").unwrap().translation, "2");
        assert_eq!(resource.find_message("a", "x").unwrap().translation, "1");
        assert!(resource.find_message("b", "x").is_none());
    }
}

//! Support for GNU gettext `.po` / `.pot` text catalogs.
//!
//! Provides parsing, serialization, and conversion to/from the internal `Resource` model.

use std::io::Write;

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::{
    error::Error,
    formats::{decode_bytes, encoding_for_label, utf8_header},
    traits::Parser,
    types::{Header, Message, Resource},
};

lazy_static! {
    static ref CHARSET_SNIFF_REGEX: Regex = Regex::new(r"charset\s*=\s*([A-Za-z0-9_\-.:]+)").unwrap();
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A parsed `.po` file: every entry in file order, including the header entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub entries: Vec<Entry>,
}

/// One PO entry with its translator-facing annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub message: Message,
    /// Raw comment lines (`# ...`, `#. ...`, `#: ...`), kept verbatim.
    pub comments: Vec<String>,
    /// Flags from `#,` lines, e.g. `fuzzy` or `c-format`.
    pub flags: Vec<String>,
}

impl Entry {
    pub fn is_fuzzy(&self) -> bool {
        self.flags.iter().any(|flag| flag == "fuzzy")
    }

    /// The header entry is the one with an empty `msgid` and no context.
    pub fn is_header(&self) -> bool {
        self.message.id.is_empty() && self.message.context.is_empty()
    }
}

impl Format {
    /// The catalog header, or an empty one when the file has none.
    pub fn header(&self) -> Header {
        self.entries
            .iter()
            .find(|entry| entry.is_header())
            .map(|entry| Header::parse(&entry.message.translation))
            .unwrap_or_default()
    }

    /// Converts into a `Resource`, optionally dropping fuzzy entries.
    /// The header is always kept, fuzzy or not.
    pub fn into_resource(self, include_fuzzy: bool) -> Resource {
        let header = self.header();
        let messages = self
            .entries
            .into_iter()
            .filter(|entry| !entry.is_header())
            .filter(|entry| include_fuzzy || !entry.is_fuzzy())
            .map(|entry| entry.message)
            .collect();
        Resource::new(header, messages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str,
    StrPlural(usize),
}

#[derive(Default)]
struct Pending {
    comments: Vec<String>,
    flags: Vec<String>,
    context: Option<String>,
    id: Option<String>,
    id_plural: Option<String>,
    translation: Option<String>,
    plurals: Vec<String>,
    last: Option<Field>,
    obsolete: bool,
    start_line: usize,
}

impl Pending {
    fn has_keywords(&self) -> bool {
        self.last.is_some()
    }

    fn has_msgstr(&self) -> bool {
        self.translation.is_some() || !self.plurals.is_empty()
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Context => self.context.get_or_insert_with(String::new),
            Field::Id => self.id.get_or_insert_with(String::new),
            Field::IdPlural => self.id_plural.get_or_insert_with(String::new),
            Field::Str => self.translation.get_or_insert_with(String::new),
            Field::StrPlural(index) => &mut self.plurals[index],
        }
    }

    fn finish(self) -> Result<Option<Entry>, Error> {
        if self.obsolete || !self.has_keywords() {
            return Ok(None);
        }
        let has_msgstr = self.has_msgstr();
        let Some(id) = self.id else {
            return Err(Error::decode(format!(
                "line {}: entry has no msgid",
                self.start_line
            )));
        };
        if !has_msgstr {
            return Err(Error::decode(format!(
                "line {}: msgid {:?} has no msgstr",
                self.start_line, id
            )));
        }

        let translation = match self.translation {
            Some(translation) => translation,
            None => self.plurals.first().cloned().unwrap_or_default(),
        };
        Ok(Some(Entry {
            message: Message {
                context: self.context.unwrap_or_default(),
                id,
                id_plural: self.id_plural.unwrap_or_default(),
                translation,
                plural_translations: self.plurals,
            },
            comments: self.comments,
            flags: self.flags,
        }))
    }
}

/// Decodes PO bytes into text. UTF-8 is tried first; otherwise the
/// declared `charset=` is sniffed from the raw bytes.
fn decode_text(bytes: &[u8]) -> Result<String, Error> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    let label = CHARSET_SNIFF_REGEX
        .captures(bytes)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .ok_or_else(|| Error::decode("file is not valid UTF-8 and declares no charset"))?;
    decode_bytes(encoding_for_label(Some(&label)), bytes)
}

/// Parses a `"..."` literal, resolving C escapes.
fn parse_quoted(text: &str, line: usize) -> Result<String, Error> {
    let text = text.trim();
    let Some(body) = text.strip_prefix('"') else {
        return Err(Error::decode(format!("line {line}: expected a quoted string")));
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let rest = chars.as_str().trim();
                if !rest.is_empty() {
                    return Err(Error::decode(format!(
                        "line {line}: unexpected text after string: {rest:?}"
                    )));
                }
                return Ok(out);
            }
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| Error::decode(format!("line {line}: unterminated string")))?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'a' => out.push('\x07'),
                    'b' => out.push('\x08'),
                    'f' => out.push('\x0c'),
                    'v' => out.push('\x0b'),
                    '"' | '\\' | '\'' | '?' => out.push(escaped),
                    '0'..='7' => {
                        let mut value = escaped.to_digit(8).unwrap_or_default();
                        for _ in 0..2 {
                            match chars.clone().next().and_then(|d| d.to_digit(8)) {
                                Some(digit) => {
                                    value = value * 8 + digit;
                                    chars.next();
                                }
                                None => break,
                            }
                        }
                        out.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    other => {
                        return Err(Error::decode(format!(
                            "line {line}: invalid escape sequence \\{other}"
                        )));
                    }
                }
            }
            _ => out.push(c),
        }
    }
    Err(Error::decode(format!("line {line}: unterminated string")))
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(r"\n"),
            '\t' => out.push_str(r"\t"),
            '\r' => out.push_str(r"\r"),
            '\x07' => out.push_str(r"\a"),
            '\x08' => out.push_str(r"\b"),
            '\x0c' => out.push_str(r"\f"),
            '\x0b' => out.push_str(r"\v"),
            _ => out.push(c),
        }
    }
    out
}

/// Writes `keyword "value"`, wrapping multi-line values GNU style.
fn write_field<W: Write>(writer: &mut W, keyword: &str, value: &str) -> Result<(), Error> {
    let lines: Vec<&str> = value.split_inclusive('\n').collect();
    if lines.len() <= 1 {
        writeln!(writer, "{keyword} \"{}\"", escape(value))?;
    } else {
        writeln!(writer, "{keyword} \"\"")?;
        for line in lines {
            writeln!(writer, "\"{}\"", escape(line))?;
        }
    }
    Ok(())
}

impl Parser for Format {
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let text = decode_text(bytes)?;
        let mut entries = Vec::new();
        let mut pending = Pending::default();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();

            if line.is_empty() {
                if pending.has_keywords() || pending.obsolete {
                    entries.extend(std::mem::take(&mut pending).finish()?);
                }
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                let leaves_obsolete = pending.obsolete && !comment.starts_with('~');
                if pending.has_msgstr() || leaves_obsolete {
                    entries.extend(std::mem::take(&mut pending).finish()?);
                }
                if comment.starts_with('~') {
                    pending.obsolete = true;
                } else if let Some(flags) = comment.strip_prefix(',') {
                    pending.flags.extend(
                        flags
                            .split(',')
                            .map(str::trim)
                            .filter(|f| !f.is_empty())
                            .map(String::from),
                    );
                } else if !comment.starts_with('|') {
                    pending.comments.push(line.to_string());
                }
                continue;
            }

            if line.starts_with('"') {
                let Some(field) = pending.last else {
                    return Err(Error::decode(format!(
                        "line {line_no}: string continuation without a keyword"
                    )));
                };
                let value = parse_quoted(line, line_no)?;
                pending.field_mut(field).push_str(&value);
                continue;
            }

            let (keyword, rest) = line
                .split_once(|c: char| c.is_whitespace())
                .unwrap_or((line, ""));
            let field = match keyword {
                "msgctxt" => Field::Context,
                "msgid" => Field::Id,
                "msgid_plural" => Field::IdPlural,
                "msgstr" => Field::Str,
                _ => match keyword
                    .strip_prefix("msgstr[")
                    .and_then(|s| s.strip_suffix(']'))
                    .and_then(|s| s.parse::<usize>().ok())
                {
                    Some(index) => Field::StrPlural(index),
                    None => {
                        return Err(Error::decode(format!(
                            "line {line_no}: unrecognized keyword {keyword:?}"
                        )));
                    }
                },
            };

            if pending.obsolete
                || (matches!(field, Field::Context | Field::Id) && pending.has_msgstr())
            {
                entries.extend(std::mem::take(&mut pending).finish()?);
            }
            if !pending.has_keywords() {
                pending.start_line = line_no;
            }

            let out_of_place = match field {
                Field::Context => pending.context.is_some() || pending.id.is_some(),
                Field::Id => pending.id.is_some(),
                Field::IdPlural => pending.id.is_none() || pending.id_plural.is_some() || pending.has_msgstr(),
                Field::Str => pending.id.is_none() || pending.has_msgstr(),
                Field::StrPlural(index) => {
                    pending.id.is_none() || pending.translation.is_some() || index != pending.plurals.len()
                }
            };
            if out_of_place {
                return Err(Error::decode(format!(
                    "line {line_no}: unexpected {keyword}"
                )));
            }

            let value = parse_quoted(rest, line_no)?;
            if let Field::StrPlural(_) = field {
                pending.plurals.push(String::new());
            }
            *pending.field_mut(field) = value;
            pending.last = Some(field);
        }

        entries.extend(pending.finish()?);
        Ok(Format { entries })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        for (index, entry) in self.entries.iter().enumerate() {
            if index > 0 {
                writeln!(writer)?;
            }
            for comment in &entry.comments {
                writeln!(writer, "{comment}")?;
            }
            if !entry.flags.is_empty() {
                writeln!(writer, "#, {}", entry.flags.join(", "))?;
            }

            let message = &entry.message;
            if !message.context.is_empty() {
                write_field(&mut writer, "msgctxt", &message.context)?;
            }
            write_field(&mut writer, "msgid", &message.id)?;

            if message.is_plural() {
                write_field(&mut writer, "msgid_plural", &message.id_plural)?;
                if message.plural_translations.is_empty() {
                    write_field(&mut writer, "msgstr[0]", &message.translation)?;
                }
                for (i, form) in message.plural_translations.iter().enumerate() {
                    write_field(&mut writer, &format!("msgstr[{i}]"), form)?;
                }
            } else if entry.is_header() {
                let header = utf8_header(&Header::parse(&message.translation));
                write_field(&mut writer, "msgstr", &header.to_string())?;
            } else {
                write_field(&mut writer, "msgstr", &message.translation)?;
            }
        }
        Ok(())
    }
}

impl From<Format> for Resource {
    fn from(format: Format) -> Self {
        format.into_resource(true)
    }
}

impl From<Resource> for Format {
    fn from(resource: Resource) -> Self {
        let mut entries = Vec::with_capacity(resource.messages.len() + 1);
        if !resource.header.is_empty() {
            entries.push(Entry {
                message: Message::new("", "", &resource.header.to_string()),
                ..Default::default()
            });
        }
        entries.extend(resource.messages.into_iter().map(|message| Entry {
            message,
            ..Default::default()
        }));
        Format { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {r#"
        # French translations for demo.
        msgid ""
        msgstr ""
        "Project-Id-Version: demo 1.0\n"
        "Language: fr\n"
        "Content-Type: text/plain; charset=UTF-8\n"
        "Plural-Forms: nplurals=2; plural=(n > 1);\n"

        #. Shown on the start screen
        #: src/main.rs:10
        msgid "Hello"
        msgstr "Bonjour"

        msgctxt "menu"
        msgid "Open"
        msgstr "Ouvrir"

        #, fuzzy, c-format
        msgid "%d file"
        msgid_plural "%d files"
        msgstr[0] "%d fichier"
        msgstr[1] "%d fichiers"

        msgid "Multi"
        msgstr ""
        "line one\n"
        "line \"two\""

        #~ msgid "Old"
        #~ msgstr "Ancien"
    "#};

    #[test]
    fn test_parse_sample() {
        let format = Format::from_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(format.entries.len(), 5);

        let header = format.header();
        assert_eq!(header.language(), Some("fr"));
        assert_eq!(header.plural_forms(), Some("nplurals=2; plural=(n > 1);"));
        assert_eq!(format.entries[0].comments, vec!["# French translations for demo."]);

        let hello = &format.entries[1];
        assert_eq!(hello.message, Message::new("", "Hello", "Bonjour"));
        assert_eq!(hello.comments, vec!["#. Shown on the start screen", "#: src/main.rs:10"]);

        assert_eq!(format.entries[2].message, Message::new("menu", "Open", "Ouvrir"));

        let files = &format.entries[3];
        assert!(files.is_fuzzy());
        assert_eq!(files.flags, vec!["fuzzy", "c-format"]);
        assert_eq!(
            files.message,
            Message::plural("", "%d file", "%d files", &["%d fichier", "%d fichiers"])
        );

        assert_eq!(format.entries[4].message.translation, "line one\nline \"two\"");
    }

    #[test]
    fn test_into_resource_filters_fuzzy() {
        let format = Format::from_bytes(SAMPLE.as_bytes()).unwrap();
        let all = format.clone().into_resource(true);
        assert_eq!(all.messages.len(), 4);
        assert_eq!(all.language(), Some("fr"));

        let strict = format.into_resource(false);
        assert_eq!(strict.messages.len(), 3);
        assert!(strict.find_message("", "%d file").is_none());
    }

    #[test]
    fn test_write_then_parse() {
        let format = Format::from_bytes(SAMPLE.as_bytes()).unwrap();
        let written = String::from_utf8(format.to_bytes().unwrap()).unwrap();
        assert!(written.contains("#, fuzzy, c-format\n"));
        assert!(written.contains("msgstr \"\"\n\"line one\\n\"\n\"line \\\"two\\\"\"\n"));

        let reparsed = Format::from_bytes(written.as_bytes()).unwrap();
        assert_eq!(reparsed, format);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(parse_quoted(r#""a\tb\\c\"d""#, 1).unwrap(), "a\tb\\c\"d");
        assert_eq!(parse_quoted(r#""\101\7""#, 1).unwrap(), "A\x07");
        assert!(parse_quoted(r#""\q""#, 1).is_err());
        assert!(parse_quoted(r#""open"#, 1).is_err());
        assert!(parse_quoted(r#""a" b"#, 1).is_err());
        assert!(parse_quoted("bare", 1).is_err());
        assert_eq!(parse_quoted(&format!("\"{}\"", escape("x\n\"y\"\t\\")), 1).unwrap(), "x\n\"y\"\t\\");
    }

    #[test]
    fn test_entries_without_blank_lines() {
        let text = indoc! {r#"
            msgid "a"
            msgstr "1"
            msgid "b"
            msgstr "2"
            # comment
            msgid "c"
            msgstr "3"
        "#};
        let format = Format::from_bytes(text.as_bytes()).unwrap();
        let ids: Vec<&str> = format.entries.iter().map(|e| e.message.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(format.entries[2].comments, vec!["# comment"]);
    }

    #[test]
    fn test_entry_right_after_obsolete_block() {
        let text = indoc! {r#"
            msgid "a"
            msgstr "A"

            #~ msgid "Old"
            #~ msgstr "Alt"
            msgid "b"
            msgstr "B"
            #~ msgid "Older"
            #~ msgstr "Älter"
            #, fuzzy
            msgid "c"
            msgstr "C"
        "#};
        let resource = Resource::from(Format::from_bytes(text.as_bytes()).unwrap());
        assert_eq!(
            resource.messages,
            vec![
                Message::new("", "a", "A"),
                Message::new("", "b", "B"),
                Message::new("", "c", "C"),
            ]
        );
        let format = Format::from_bytes(text.as_bytes()).unwrap();
        assert!(format.entries[2].is_fuzzy());
    }

    #[test]
    fn test_missing_msgstr_reports_the_msgid() {
        let err = Format::from_bytes(b"msgid \"lonely\"\n").unwrap_err();
        assert!(err.to_string().contains("\"lonely\" has no msgstr"), "{err}");
        let err = Format::from_bytes(b"msgctxt \"ctx\"\n\n").unwrap_err();
        assert!(err.to_string().contains("entry has no msgid"), "{err}");
    }

    #[test]
    fn test_decode_errors_carry_line_numbers() {
        let cases = [
            ("msgid \"a\"\nmsgstr \"b\"\nbogus \"c\"\n", "line 3"),
            ("msgstr \"orphan\"\n", "line 1"),
            ("msgid \"a\"\n\n", "no msgstr"),
            ("msgid \"a\"\nmsgid_plural \"as\"\nmsgstr[1] \"x\"\n", "line 3"),
            ("\"dangling\"\n", "line 1"),
            ("msgid \"a\"\nmsgid \"b\"\n", "line 2"),
        ];
        for (text, needle) in cases {
            let err = Format::from_bytes(text.as_bytes()).unwrap_err();
            assert!(err.is_decode_error(), "{text:?}");
            assert!(err.to_string().contains(needle), "{text:?}: {err}");
        }
    }

    #[test]
    fn test_latin1_file() {
        let mut bytes = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\n".to_vec();
        bytes.extend_from_slice(b"msgid \"coffee\"\nmsgstr \"caf\xe9\"\n");
        let resource = Resource::from(Format::from_bytes(&bytes).unwrap());
        assert_eq!(resource.messages, vec![Message::new("", "coffee", "café")]);
    }

    #[test]
    fn test_invalid_bytes_without_charset() {
        let err = Format::from_bytes(b"msgid \"x\"\nmsgstr \"\xff\"\n").unwrap_err();
        assert!(err.to_string().contains("declares no charset"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"msgid \"a\"\nmsgstr \"b\"\n");
        let format = Format::from_bytes(&bytes).unwrap();
        assert_eq!(format.entries[0].message.id, "a");
    }

    #[test]
    fn test_from_resource_writes_header_first() {
        let mut header = Header::default();
        header.set("Language", "de");
        header.set("Content-Type", "text/plain; charset=ISO-8859-1");
        let resource = Resource::new(header, vec![Message::new("", "Yes", "Ja")]);

        let written = String::from_utf8(Format::from(resource).to_bytes().unwrap()).unwrap();
        assert!(written.starts_with("msgid \"\"\nmsgstr \"\"\n\"Language: de\\n\""));
        assert!(written.contains("charset=UTF-8"));

        let back = Resource::from(Format::from_bytes(written.as_bytes()).unwrap());
        assert_eq!(back.language(), Some("de"));
        assert_eq!(back.messages, vec![Message::new("", "Yes", "Ja")]);
    }
}

//! Support for JSON message arrays.
//!
//! The file is an array of objects shaped like PO entries:
//!
//! ```json
//! [
//!   { "msgctxt": "menu", "msgid": "Open", "msgstr": ["Abrir"] },
//!   { "msgid": "file", "msgid_plural": "files", "msgstr": ["archivo", "archivos"] }
//! ]
//! ```
//!
//! Every field is optional and `null` reads as absent. `msgstr` is taken as the list of plural forms and
//! its first element is the singular translation. JSON carries no header, so
//! the language has to be supplied by the caller.

use std::io::Write;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::Error,
    traits::Parser,
    types::{Header, Message, Resource},
};

/// One JSON message object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub msgctxt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msgid: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub msgid_plural: String,
    #[serde(default, deserialize_with = "nullable_strings")]
    pub msgstr: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A `null` list is empty and a `null` form is an empty string.
fn nullable_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let forms = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(forms
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// A decoded JSON catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub records: Vec<Record>,
}

impl Format {
    /// Converts into a `Resource` whose header carries `language`, if given.
    pub fn into_resource(self, language: Option<&str>) -> Resource {
        let mut header = Header::default();
        if let Some(language) = language {
            header.set(Header::LANGUAGE, language);
        }
        Resource::new(header, self.records.into_iter().map(Message::from).collect())
    }
}

impl Parser for Format {
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let records = serde_json::from_slice(bytes)?;
        Ok(Format { records })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(&mut writer, &self.records)?;
        writeln!(writer)?;
        Ok(())
    }
}

impl From<Record> for Message {
    fn from(record: Record) -> Self {
        Message {
            context: record.msgctxt,
            id: record.msgid,
            id_plural: record.msgid_plural,
            translation: record.msgstr.first().cloned().unwrap_or_default(),
            plural_translations: record.msgstr,
        }
    }
}

impl From<Message> for Record {
    fn from(message: Message) -> Self {
        let msgstr = if !message.plural_translations.is_empty() {
            message.plural_translations
        } else if !message.translation.is_empty() {
            vec![message.translation]
        } else {
            Vec::new()
        };
        Record {
            msgctxt: message.context,
            msgid: message.id,
            msgid_plural: message.id_plural,
            msgstr,
        }
    }
}

impl From<Format> for Resource {
    fn from(format: Format) -> Self {
        format.into_resource(None)
    }
}

impl From<Resource> for Format {
    fn from(resource: Resource) -> Self {
        Format {
            records: resource.messages.into_iter().map(Record::from).collect(),
        }
    }
}

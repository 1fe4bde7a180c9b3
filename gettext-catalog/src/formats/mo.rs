//! Support for compiled GNU gettext `.mo` catalogs.
//!
//! Layout (all integers u32, byte order given by the magic number):
//!
//! | offset | field                                  |
//! |--------|----------------------------------------|
//! | 0      | magic `0x950412de`                     |
//! | 4      | revision                               |
//! | 8      | number of strings N                    |
//! | 12     | offset of the original strings table   |
//! | 16     | offset of the translated strings table |
//! | 20     | hash table size (unused here)          |
//! | 24     | hash table offset (unused here)        |
//!
//! Each table holds N `(length, offset)` pairs.

use std::io::Write;

use crate::{
    error::Error,
    formats::{decode_bytes, encoding_for_label, utf8_header},
    traits::Parser,
    types::{Header, Message, Resource},
};

/// Magic number of a MO file, as read in the file's own byte order.
pub const MAGIC: u32 = 0x950412de;

/// Separates `msgctxt` from `msgid` in an original string.
pub const CONTEXT_SEPARATOR: u8 = 0x04;

/// Separates `msgid` from `msgid_plural`, and plural translations from each other.
pub const PLURAL_SEPARATOR: u8 = 0x00;

const HEADER_SIZE: usize = 28;

/// A decoded `.mo` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub header: Header,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

struct Reader<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, Error> {
        let head: [u8; 4] = bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::decode("file too short for a MO header"))?;
        let order = if u32::from_le_bytes(head) == MAGIC {
            ByteOrder::Little
        } else if u32::from_be_bytes(head) == MAGIC {
            ByteOrder::Big
        } else {
            return Err(Error::decode(format!(
                "bad magic number 0x{:08x}",
                u32::from_le_bytes(head)
            )));
        };
        Ok(Self { bytes, order })
    }

    fn u32_at(&self, offset: usize) -> Result<u32, Error> {
        let word: [u8; 4] = offset
            .checked_add(4)
            .and_then(|end| self.bytes.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::decode(format!("offset {offset} is out of bounds")))?;
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(word),
            ByteOrder::Big => u32::from_be_bytes(word),
        })
    }

    fn usize_at(&self, offset: usize) -> Result<usize, Error> {
        self.u32_at(offset).map(|v| v as usize)
    }

    /// The `index`-th string of the table starting at `table`.
    fn string(&self, table: usize, index: usize) -> Result<&'a [u8], Error> {
        let entry = index
            .checked_mul(8)
            .and_then(|delta| table.checked_add(delta))
            .ok_or_else(|| Error::decode("string table offset overflows"))?;
        let length = self.usize_at(entry)?;
        let offset = self.usize_at(entry + 4)?;
        offset
            .checked_add(length)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                Error::decode(format!(
                    "string {index} ({length} bytes at {offset}) is out of bounds"
                ))
            })
    }
}

fn split_once(bytes: &[u8], separator: u8) -> (&[u8], Option<&[u8]>) {
    match bytes.iter().position(|&b| b == separator) {
        Some(at) => (&bytes[..at], Some(&bytes[at + 1..])),
        None => (bytes, None),
    }
}

fn decode_message(
    original: &[u8],
    translated: &[u8],
    encoding: &'static encoding_rs::Encoding,
) -> Result<Message, Error> {
    let (context, rest) = match split_once(original, CONTEXT_SEPARATOR) {
        (context, Some(rest)) => (decode_bytes(encoding, context)?, rest),
        (rest, None) => (String::new(), rest),
    };
    let (id, id_plural) = split_once(rest, PLURAL_SEPARATOR);
    let id = decode_bytes(encoding, id)?;

    let mut message = Message {
        context,
        id,
        ..Default::default()
    };
    match id_plural {
        Some(id_plural) => {
            message.id_plural = decode_bytes(encoding, id_plural)?;
            message.plural_translations = translated
                .split(|&b| b == PLURAL_SEPARATOR)
                .map(|form| decode_bytes(encoding, form))
                .collect::<Result<_, _>>()?;
            message.translation = message
                .plural_translations
                .first()
                .cloned()
                .unwrap_or_default();
        }
        None => message.translation = decode_bytes(encoding, translated)?,
    }
    Ok(message)
}

fn encode_message(message: &Message) -> (Vec<u8>, Vec<u8>) {
    let mut original = Vec::new();
    if !message.context.is_empty() {
        original.extend_from_slice(message.context.as_bytes());
        original.push(CONTEXT_SEPARATOR);
    }
    original.extend_from_slice(message.id.as_bytes());

    let translated = if message.is_plural() {
        original.push(PLURAL_SEPARATOR);
        original.extend_from_slice(message.id_plural.as_bytes());
        if message.plural_translations.is_empty() {
            message.translation.clone().into_bytes()
        } else {
            message
                .plural_translations
                .join("\0")
                .into_bytes()
        }
    } else {
        message.translation.clone().into_bytes()
    };
    (original, translated)
}

impl Parser for Format {
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let reader = Reader::new(bytes)?;

        let revision = reader.u32_at(4)?;
        if revision >> 16 > 1 {
            return Err(Error::decode(format!(
                "unsupported MO revision {}.{}",
                revision >> 16,
                revision & 0xffff
            )));
        }
        let count = reader.usize_at(8)?;
        let originals = reader.usize_at(12)?;
        let translations = reader.usize_at(16)?;

        let mut raw = Vec::with_capacity(count.min(bytes.len() / 8));
        for index in 0..count {
            raw.push((
                reader.string(originals, index)?,
                reader.string(translations, index)?,
            ));
        }

        // The charset label is ASCII, so a lossy read is enough to find it.
        let header_guess = raw
            .iter()
            .find(|(original, _)| original.is_empty())
            .map(|(_, translated)| Header::parse(&String::from_utf8_lossy(translated)));
        let encoding = encoding_for_label(header_guess.as_ref().and_then(Header::charset));

        let mut header = Header::default();
        let mut messages = Vec::with_capacity(raw.len());
        for (original, translated) in raw {
            if original.is_empty() {
                header = Header::parse(&decode_bytes(encoding, translated)?);
            } else {
                messages.push(decode_message(original, translated, encoding)?);
            }
        }

        Ok(Format { header, messages })
    }

    /// Writes a little-endian, revision 0 file with strings sorted by their
    /// original bytes and no hash table.
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(self.messages.len() + 1);
        let header = utf8_header(&self.header);
        if !header.is_empty() {
            entries.push((Vec::new(), header.to_string().into_bytes()));
        }
        entries.extend(self.messages.iter().map(encode_message));
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let count = entries.len();
        let originals_at = HEADER_SIZE;
        let translations_at = originals_at + count * 8;
        let strings_at = translations_at + count * 8;

        let mut tables = Vec::with_capacity(count * 16);
        let mut strings = Vec::new();
        let place = |bytes: &[u8], strings: &mut Vec<u8>| -> Result<[u32; 2], Error> {
            let offset = to_u32(strings_at + strings.len())?;
            strings.extend_from_slice(bytes);
            strings.push(0);
            Ok([to_u32(bytes.len())?, offset])
        };

        let mut original_table = Vec::with_capacity(count);
        for (original, _) in &entries {
            original_table.push(place(original, &mut strings)?);
        }
        let mut translation_table = Vec::with_capacity(count);
        for (_, translated) in &entries {
            translation_table.push(place(translated, &mut strings)?);
        }
        for pair in original_table.iter().chain(translation_table.iter()) {
            tables.extend_from_slice(&pair[0].to_le_bytes());
            tables.extend_from_slice(&pair[1].to_le_bytes());
        }

        let header_words = [
            MAGIC,
            0,
            to_u32(count)?,
            to_u32(originals_at)?,
            to_u32(translations_at)?,
            0,
            to_u32(strings_at)?,
        ];
        for word in header_words {
            writer.write_all(&word.to_le_bytes())?;
        }
        writer.write_all(&tables)?;
        writer.write_all(&strings)?;
        Ok(())
    }
}

fn to_u32(value: usize) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| Error::UnsupportedFormat("catalog too large for MO".into()))
}

impl From<Format> for Resource {
    fn from(format: Format) -> Self {
        Resource::new(format.header, format.messages)
    }
}

impl From<Resource> for Format {
    fn from(resource: Resource) -> Self {
        Format {
            header: resource.header,
            messages: resource.messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Format {
        Format {
            header: Header::parse(
                "Language: ru\n\
                 Content-Type: text/plain; charset=UTF-8\n\
                 Plural-Forms: nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);\n",
            ),
            messages: vec![
                Message::new("", "Hello", "Привет"),
                Message::new("menu", "Open", "Открыть"),
                Message::plural("", "file", "files", &["файл", "файла", "файлов"]),
            ],
        }
    }

    #[test]
    fn test_mo_encode_decode() {
        let format = sample();
        let bytes = format.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());

        let decoded = Format::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.header, format.header);
        assert_eq!(decoded.messages.len(), 3);
        for message in &format.messages {
            assert!(decoded.messages.contains(message), "missing {message}");
        }
    }

    #[test]
    fn test_mo_context_and_plural_split() {
        let bytes = sample().to_bytes().unwrap();
        let decoded = Format::from_bytes(&bytes).unwrap();

        let open = decoded.messages.iter().find(|m| m.id == "Open").unwrap();
        assert_eq!(open.context, "menu");
        assert_eq!(open.translation, "Открыть");
        assert!(open.plural_translations.is_empty());

        let file = decoded.messages.iter().find(|m| m.id == "file").unwrap();
        assert_eq!(file.id_plural, "files");
        assert_eq!(file.translation, "файл");
        assert_eq!(file.plural_translations, vec!["файл", "файла", "файлов"]);
    }

    #[test]
    fn test_mo_big_endian() {
        // One message "a" -> "b", no header.
        let mut bytes = Vec::new();
        for word in [MAGIC, 0, 1, 28, 36, 0, 44] {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        for word in [1u32, 44, 1, 46] {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes.extend_from_slice(b"a\0b\0");

        let decoded = Format::from_bytes(&bytes).unwrap();
        assert!(decoded.header.is_empty());
        assert_eq!(decoded.messages, vec![Message::new("", "a", "b")]);
    }

    #[test]
    fn test_mo_latin1_charset() {
        let mut bytes = Vec::new();
        let header = b"Content-Type: text/plain; charset=ISO-8859-1\n";
        let strings_at = 28 + 16 * 2;
        let original_b = strings_at + 1;
        let translated_header = original_b + 5;
        let translated_b = translated_header + header.len() + 1;
        for word in [MAGIC, 0, 2, 28, 44, 0, strings_at as u32] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        for word in [
            0u32,
            strings_at as u32,
            4,
            original_b as u32,
            header.len() as u32,
            translated_header as u32,
            5,
            translated_b as u32,
        ] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes.push(0);
        bytes.extend_from_slice(b"cafe\0");
        bytes.extend_from_slice(header);
        bytes.push(0);
        bytes.extend_from_slice(&[b'c', b'a', b'f', 0xe9, b's', 0]);

        let decoded = Format::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.header.charset(), Some("ISO-8859-1"));
        assert_eq!(decoded.messages, vec![Message::new("", "cafe", "cafés")]);
    }

    #[test]
    fn test_mo_rejects_bad_magic() {
        let err = Format::from_bytes(&[0u8; 28]).unwrap_err();
        assert!(err.is_decode_error());
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_mo_rejects_truncated_input() {
        assert!(Format::from_bytes(&[0xde, 0x12]).unwrap_err().is_decode_error());

        let mut bytes = sample().to_bytes().unwrap();
        bytes.truncate(bytes.len() - 10);
        assert!(Format::from_bytes(&bytes).unwrap_err().is_decode_error());
    }

    #[test]
    fn test_mo_rejects_out_of_range_tables() {
        let mut bytes = Vec::new();
        for word in [MAGIC, 0, 1000, 28, 8028, 0, 0] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let err = Format::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn test_mo_rejects_future_revision() {
        let mut bytes = Vec::new();
        for word in [MAGIC, 2 << 16, 0, 28, 28, 0, 0] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let err = Format::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("unsupported MO revision 2.0"));
    }

    #[test]
    fn test_mo_empty_catalog() {
        let bytes = Format::default().to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let decoded = Format::from_bytes(&bytes).unwrap();
        assert!(decoded.messages.is_empty());
        assert!(decoded.header.is_empty());
    }
}

//! Traits for format-agnostic decoding and encoding in gettext-catalog.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use crate::error::Error;

/// A trait for decoding and encoding one catalog file.
///
/// Catalog formats are byte oriented (MO is binary, PO carries its own
/// charset), so decoding starts from raw bytes rather than text.
///
/// # Example
///
/// ```rust,no_run
/// use gettext_catalog::traits::Parser;
/// let format = gettext_catalog::formats::po::Format::read_from("fr.po")?;
/// format.write_to("fr_copy.po")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Decode from raw bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized;

    /// Decode everything a reader yields.
    fn from_reader<R: Read>(mut reader: R) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Decode from a file path.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path).map_err(Error::Io)?;
        Self::from_bytes(&bytes)
    }

    /// Encode to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Encode to a file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush().map_err(Error::Io)
    }

    /// Encode into a byte vector.
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();
        self.to_writer(&mut bytes)?;
        Ok(bytes)
    }
}

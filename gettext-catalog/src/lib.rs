#![forbid(unsafe_code)]
//! Runtime gettext translation catalogs for Rust.
//!
//! Loads compiled `.mo` files, `.po` source files and JSON message arrays into
//! a read-only [`Catalog`] that resolves singular and plural messages, with or
//! without a disambiguating context. Lookups never fail: a message that is
//! missing or untranslated resolves to its source string.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gettext_catalog::{Catalog, ReadOptions};
//!
//! let catalog = Catalog::open("locale/de/LC_MESSAGES/app.mo", &ReadOptions::default())?;
//! println!("{}", catalog.gettext("Hello"));
//! println!("{}", catalog.ngettext("one file", "many files", 3));
//! println!("{}", catalog.pgettext("menu", "Open"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Catalogs can also be built from bytes already in memory:
//!
//! ```rust
//! use gettext_catalog::Catalog;
//!
//! let json = br#"[{"msgid": "dog", "msgid_plural": "dogs", "msgstr": ["perro", "perros"]}]"#;
//! let catalog = Catalog::from_json("es", json)?;
//! assert_eq!(catalog.ngettext("dog", "dogs", 2), "perros");
//! assert_eq!(catalog.gettext("cat"), "cat");
//! # Ok::<(), gettext_catalog::Error>(())
//! ```
//!
//! # Supported Formats
//!
//! - **MO**: GNU compiled catalogs, either byte order
//! - **PO**: GNU source catalogs, including contexts, plurals and fuzzy entries
//! - **JSON**: arrays of `{msgctxt, msgid, msgid_plural, msgstr}` objects
//!
//! # Plural rules
//!
//! A catalog's plural rule comes from the `Plural-Forms` header when present,
//! otherwise from a built-in table keyed by the `Language` header. See
//! [`PluralRule`].

pub mod catalog;
pub mod codec;
pub mod error;
pub mod formats;
pub mod plural;
pub mod read_options;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    catalog::Catalog,
    codec::{convert, convert_auto, infer_format_from_extension, infer_language_from_path},
    error::Error,
    formats::FormatType,
    plural::{PluralExpression, PluralRule, PluralSource},
    read_options::ReadOptions,
    types::{Header, Message, MessageKey, Resource},
};

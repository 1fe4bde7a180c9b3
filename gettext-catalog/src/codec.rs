//! File-level helpers: format and language inference from paths, reading a
//! catalog file into a [`Resource`], writing one back, and converting between
//! the MO, PO and JSON formats.
//!
//! All conversion goes through the `Resource` model, so any supported format
//! can be turned into any other.

use std::path::Path;

use tracing::debug;

use crate::{
    error::Error,
    formats::{FormatType, JsonFormat, MoFormat, PoFormat},
    plural::{PluralRule, parse_language_tag},
    read_options::ReadOptions,
    traits::Parser,
    types::{Header, Resource},
};

/// Directory that separates the locale from the domain in gettext trees,
/// e.g. `locale/de/LC_MESSAGES/app.mo`.
const LC_MESSAGES: &str = "LC_MESSAGES";

/// Infers a [`FormatType`] from a file path's extension.
///
/// Returns `Some(FormatType)` if the extension matches a known format, otherwise `None`.
///
/// # Example
/// ```rust
/// use gettext_catalog::formats::FormatType;
/// use gettext_catalog::codec::infer_format_from_extension;
/// assert_eq!(infer_format_from_extension("app.mo"), Some(FormatType::Mo));
/// assert_eq!(infer_format_from_extension("app.gmo"), Some(FormatType::Mo));
/// assert_eq!(infer_format_from_extension("app.pot"), Some(FormatType::Po));
/// assert_eq!(infer_format_from_extension("de.json"), Some(FormatType::Json(None)));
/// assert_eq!(infer_format_from_extension("app.txt"), None);
/// ```
pub fn infer_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FormatType> {
    let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    extension.parse().ok()
}

/// Attempts to infer the catalog language from a path.
///
/// Looks for the directory right above `LC_MESSAGES` first, then for a file
/// stem that names a language with a known plural rule (`de.json`,
/// `pt_BR.po`).
///
/// # Example
/// ```rust
/// use gettext_catalog::codec::infer_language_from_path;
/// assert_eq!(
///     infer_language_from_path("locale/pt_BR/LC_MESSAGES/app.mo"),
///     Some("pt_BR".to_string())
/// );
/// assert_eq!(infer_language_from_path("i18n/fr.json"), Some("fr".to_string()));
/// assert_eq!(infer_language_from_path("i18n/messages.json"), None);
/// ```
pub fn infer_language_from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    let components: Vec<&str> = path
        .as_ref()
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    let from_tree = components
        .windows(2)
        .rev()
        .find(|pair| pair[1] == LC_MESSAGES)
        .map(|pair| pair[0])
        .filter(|lang| parse_language_tag(lang).is_some());
    if let Some(lang) = from_tree {
        return Some(lang.to_string());
    }

    path.as_ref()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| PluralRule::is_known_language(stem))
        .map(str::to_string)
}

/// Infers both the format and, for JSON, the language from a path.
pub fn infer_format_from_path<P: AsRef<Path>>(path: P) -> Option<FormatType> {
    match infer_format_from_extension(&path)? {
        FormatType::Json(_) => Some(FormatType::Json(infer_language_from_path(&path))),
        other => Some(other),
    }
}

/// Reads a catalog file of the given format into a [`Resource`].
///
/// When the file declares no `Language`, the header is filled from the
/// format's language, the options' hint, or the path, in that order. JSON
/// catalogs fail with [`Error::MissingLanguage`] when none of those is
/// available.
pub fn read_resource<P: AsRef<Path>>(
    path: P,
    format_type: FormatType,
    options: &ReadOptions,
) -> Result<Resource, Error> {
    let path = path.as_ref();
    debug!(path = %path.display(), format = %format_type, "reading catalog");

    let language = format_type
        .language()
        .cloned()
        .or_else(|| options.language_hint.clone())
        .or_else(|| infer_language_from_path(path));

    let mut resource = match format_type {
        FormatType::Mo => Resource::from(MoFormat::read_from(path)?),
        FormatType::Po => PoFormat::read_from(path)?.into_resource(options.include_fuzzy),
        FormatType::Json(_) => {
            let Some(language) = language.as_deref() else {
                return Err(Error::MissingLanguage(format!(
                    "cannot infer the language of `{}`, please provide one",
                    path.display()
                )));
            };
            return Ok(JsonFormat::read_from(path)?.into_resource(Some(language)));
        }
    };

    if resource.header.language().is_none()
        && let Some(language) = language
    {
        resource.header.set(Header::LANGUAGE, language);
    }
    Ok(resource)
}

/// Reads a catalog file, picking the format from its extension.
pub fn read_resource_auto<P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
) -> Result<Resource, Error> {
    let format_type = infer_format_from_extension(&path).ok_or_else(|| {
        Error::UnknownFormat(format!(
            "cannot infer the format of `{}`",
            path.as_ref().display()
        ))
    })?;
    read_resource(path, format_type, options)
}

/// Writes a [`Resource`] in the given format. Text output is always UTF-8.
pub fn write_resource<P: AsRef<Path>>(
    resource: Resource,
    path: P,
    format_type: &FormatType,
) -> Result<(), Error> {
    let path = path.as_ref();
    debug!(
        path = %path.display(),
        format = %format_type,
        messages = resource.messages.len(),
        "writing catalog"
    );
    match format_type {
        FormatType::Mo => MoFormat::from(resource).write_to(path),
        FormatType::Po => PoFormat::from(resource).write_to(path),
        FormatType::Json(_) => JsonFormat::from(resource).write_to(path),
    }
}

/// Convert a catalog file from one format to another.
///
/// # Arguments
///
/// * `input` - The input file path.
/// * `input_format` - The format of the input file.
/// * `output` - The output file path.
/// * `output_format` - The format of the output file.
/// * `options` - How the input is read.
///
/// # Errors
///
/// Returns an `Error` if reading, parsing, or writing fails.
///
/// # Example
///
/// ```rust,no_run
/// use gettext_catalog::{ReadOptions, convert, formats::FormatType};
/// convert(
///     "locale/de/LC_MESSAGES/app.po",
///     FormatType::Po,
///     "locale/de/LC_MESSAGES/app.mo",
///     FormatType::Mo,
///     &ReadOptions::default(),
/// )?;
/// # Ok::<(), gettext_catalog::Error>(())
/// ```
pub fn convert<P: AsRef<Path>>(
    input: P,
    input_format: FormatType,
    output: P,
    output_format: FormatType,
    options: &ReadOptions,
) -> Result<(), Error> {
    let resource = read_resource(input, input_format, options)?;
    write_resource(resource, output, &output_format)
}

/// Convert a catalog file, inferring both formats from the extensions.
///
/// # Example
///
/// ```rust,no_run
/// use gettext_catalog::convert_auto;
/// convert_auto("po/fr.po", "locale/fr/LC_MESSAGES/app.mo")?;
/// # Ok::<(), gettext_catalog::Error>(())
/// ```
pub fn convert_auto<P: AsRef<Path>>(input: P, output: P) -> Result<(), Error> {
    let input_format = infer_format_from_path(&input).ok_or_else(|| {
        Error::UnknownFormat(format!(
            "cannot infer the input format of `{}`",
            input.as_ref().display()
        ))
    })?;
    let output_format = infer_format_from_extension(&output).ok_or_else(|| {
        Error::UnknownFormat(format!(
            "cannot infer the output format of `{}`",
            output.as_ref().display()
        ))
    })?;
    convert(input, input_format, output, output_format, &ReadOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use std::fs;

    fn sample() -> Resource {
        let mut header = Header::default();
        header.set(Header::LANGUAGE, "de");
        Resource::new(
            header,
            vec![
                Message::new("", "Hello", "Hallo"),
                Message::plural("", "file", "files", &["Datei", "Dateien"]),
            ],
        )
    }

    #[test]
    fn test_infer_format_is_case_insensitive() {
        assert_eq!(infer_format_from_extension("APP.MO"), Some(FormatType::Mo));
        assert_eq!(infer_format_from_extension("no_extension"), None);
    }

    #[test]
    fn test_infer_language_prefers_lc_messages_tree() {
        assert_eq!(
            infer_language_from_path("share/locale/ru/LC_MESSAGES/fr.mo"),
            Some("ru".to_string())
        );
        assert_eq!(infer_language_from_path("po/sr@latin.po"), Some("sr@latin".to_string()));
        assert_eq!(infer_language_from_path("app.po"), None);
    }

    #[test]
    fn test_infer_format_from_path_attaches_language() {
        assert_eq!(
            infer_format_from_path("i18n/es.json"),
            Some(FormatType::Json(Some("es".to_string())))
        );
        assert_eq!(infer_format_from_path("i18n/es.po"), Some(FormatType::Po));
    }

    #[test]
    fn test_json_without_language_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        fs::write(&path, r#"[{"msgid":"a","msgstr":["b"]}]"#).unwrap();

        let err = read_resource_auto(&path, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MissingLanguage(_)));

        let options = ReadOptions::new().with_language_hint(Some("it".into()));
        let resource = read_resource_auto(&path, &options).unwrap();
        assert_eq!(resource.language(), Some("it"));
    }

    #[test]
    fn test_hint_fills_missing_header_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.po");
        fs::write(&path, "msgid \"a\"\nmsgstr \"b\"\n").unwrap();

        let options = ReadOptions::new().with_language_hint(Some("pl".into()));
        let resource = read_resource(&path, FormatType::Po, &options).unwrap();
        assert_eq!(resource.language(), Some("pl"));
    }

    #[test]
    fn test_unknown_extension() {
        let err = read_resource_auto("catalog.txt", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat(_)));
    }

    #[test]
    fn test_convert_po_mo_json() {
        let dir = tempfile::tempdir().unwrap();
        let po = dir.path().join("de.po");
        let mo = dir.path().join("de.mo");
        let json = dir.path().join("de.json");

        write_resource(sample(), &po, &FormatType::Po).unwrap();
        convert_auto(&po, &mo).unwrap();
        convert_auto(&mo, &json).unwrap();

        let from_mo = read_resource_auto(&mo, &ReadOptions::default()).unwrap();
        assert_eq!(from_mo.language(), Some("de"));
        assert_eq!(from_mo.find_message("", "Hello").unwrap().translation, "Hallo");

        let from_json = read_resource_auto(&json, &ReadOptions::default()).unwrap();
        assert_eq!(from_json.language(), Some("de"));
        assert_eq!(
            from_json.find_message("", "file").unwrap().plural_translations,
            vec!["Datei", "Dateien"]
        );
    }
}

//! The translation catalog and its lookup/fallback algorithm.
//!
//! A [`Catalog`] is built once from a list of messages and a plural rule and
//! is read-only afterwards. Lookups are total: a missing translation resolves
//! to the source string, never to an error.

use std::{
    collections::HashMap,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
};

use tracing::{debug, trace};

use crate::{
    codec,
    error::Error,
    formats::{JsonFormat, MoFormat, PoFormat},
    plural::{PluralRule, PluralSource},
    read_options::ReadOptions,
    traits::Parser,
    types::{Message, Resource},
};

/// One loaded language catalog.
///
/// `Catalog` is `Send + Sync`; share it behind an `Arc` once built.
#[derive(Debug)]
pub struct Catalog {
    /// Messages by context, then by id, so lookups borrow their keys.
    messages: HashMap<String, HashMap<String, Message>>,
    len: usize,
    rule: PluralRule,
    plural_overflows: AtomicU64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl Catalog {
    /// The catalog used when nothing is loaded: no messages and the
    /// unknown-language plural rule. Every lookup returns its source string.
    pub fn empty() -> Self {
        Self::with_rule(HashMap::new(), PluralRule::for_language("??"))
    }

    fn with_rule(messages: HashMap<String, HashMap<String, Message>>, rule: PluralRule) -> Self {
        Self {
            len: messages.values().map(HashMap::len).sum(),
            messages,
            rule,
            plural_overflows: AtomicU64::new(0),
        }
    }

    /// Builds a catalog from messages in order; a later message with the same
    /// `(context, id)` replaces an earlier one.
    ///
    /// Fails only when `source` is an expression that does not compile.
    pub fn new(
        messages: impl IntoIterator<Item = Message>,
        source: PluralSource,
    ) -> Result<Self, Error> {
        let rule = source.resolve()?;

        let mut map: HashMap<String, HashMap<String, Message>> = HashMap::new();
        for message in messages {
            map.entry(message.context.clone())
                .or_default()
                .insert(message.id.clone(), message);
        }

        let catalog = Self::with_rule(map, rule);
        debug!(messages = catalog.len, rule = %catalog.rule, "built translation catalog");
        Ok(catalog)
    }

    /// Builds a catalog from a decoded resource. The plural rule comes from
    /// the header's `Plural-Forms`, then its `Language`, then the language
    /// hint of `options`.
    pub fn from_resource(resource: Resource, options: &ReadOptions) -> Result<Self, Error> {
        let source = resource
            .header
            .plural_source(options.language_hint.as_deref());
        if options.strict && source == PluralSource::Unknown {
            return Err(Error::MissingLanguage(
                "catalog declares neither Plural-Forms nor Language".to_string(),
            ));
        }
        Self::new(resource.messages, source)
    }

    /// Builds a catalog from the bytes of a compiled `.mo` file.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, Error> {
        let resource = Resource::from(MoFormat::from_bytes(bytes)?);
        Self::from_resource(resource, &ReadOptions::default())
    }

    /// Builds a catalog from the bytes of a `.po` file.
    pub fn from_text(bytes: &[u8]) -> Result<Self, Error> {
        let resource = Resource::from(PoFormat::from_bytes(bytes)?);
        Self::from_resource(resource, &ReadOptions::default())
    }

    /// Builds a catalog from a JSON message array. JSON has no header, so the
    /// plural rule always comes from `language`.
    pub fn from_json(language: &str, bytes: &[u8]) -> Result<Self, Error> {
        let resource = JsonFormat::from_bytes(bytes)?.into_resource(Some(language));
        Self::new(
            resource.messages,
            PluralSource::Language(language.to_string()),
        )
    }

    /// Reads a catalog file, picking the format from its extension.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self, Error> {
        let resource = codec::read_resource_auto(path, options)?;
        Self::from_resource(resource, options)
    }

    /// Singular lookup with context.
    ///
    /// Returns the stored translation when it is non-empty; otherwise resolves
    /// as `pngettext(context, id, "", 1)`, which ends at `id` itself.
    pub fn pgettext<'a>(&'a self, context: &str, id: &'a str) -> &'a str {
        match self.get(context, id) {
            Some(message) if !message.translation.is_empty() => message.translation.as_str(),
            _ => self.pngettext(context, id, "", 1),
        }
    }

    /// Plural lookup with context.
    ///
    /// Picks the form the catalog's plural rule selects for `n`, clamped to
    /// the last stored form. Without a usable translation, falls back to
    /// `id_plural` or `id` using the English rule (`n == 1` is singular),
    /// whatever the catalog's language.
    pub fn pngettext<'a>(
        &'a self,
        context: &str,
        id: &'a str,
        id_plural: &'a str,
        n: u64,
    ) -> &'a str {
        let form = self.rule.select(n);

        if let Some(forms) = self.get(context, id).and_then(plural_strings) {
            let index = if form < forms.len() {
                form
            } else {
                self.plural_overflows.fetch_add(1, Ordering::Relaxed);
                trace!(
                    context,
                    id,
                    form,
                    available = forms.len(),
                    "plural form out of range, using the last form"
                );
                forms.len() - 1
            };
            let translated = &forms[index];
            if !translated.is_empty() {
                return translated;
            }
        }

        if !id_plural.is_empty() && PluralRule::ENGLISH.select(n) > 0 {
            id_plural
        } else {
            id
        }
    }

    /// `pgettext` without context.
    pub fn gettext<'a>(&'a self, id: &'a str) -> &'a str {
        self.pgettext("", id)
    }

    /// `pngettext` without context.
    pub fn ngettext<'a>(&'a self, id: &'a str, id_plural: &'a str, n: u64) -> &'a str {
        self.pngettext("", id, id_plural, n)
    }

    /// The stored message for `(context, id)`, if any.
    pub fn get(&self, context: &str, id: &str) -> Option<&Message> {
        self.messages.get(context)?.get(id)
    }

    pub fn contains(&self, context: &str, id: &str) -> bool {
        self.get(context, id).is_some()
    }

    /// All stored messages, in no particular order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values().flat_map(HashMap::values)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The plural rule bound at construction.
    pub fn plural_rule(&self) -> &PluralRule {
        &self.rule
    }

    /// How many plural lookups selected a form beyond the stored ones and
    /// were clamped to the last form.
    pub fn plural_overflows(&self) -> u64 {
        self.plural_overflows.load(Ordering::Relaxed)
    }
}

/// The strings a plural lookup chooses from: the plural translations when the
/// message declares `msgid_plural`, otherwise its singular translation as the
/// only form. `None` when there is nothing to choose from.
fn plural_strings(message: &Message) -> Option<&[String]> {
    let forms: &[String] = if message.is_plural() {
        &message.plural_translations
    } else if !message.translation.is_empty() {
        std::slice::from_ref(&message.translation)
    } else {
        &[]
    };
    (!forms.is_empty()).then_some(forms)
}

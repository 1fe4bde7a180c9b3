//! Plural form selection.
//!
//! A [`PluralRule`] maps a count to the index of the plural form a catalog
//! stores for it. Rules come either from a fixed per-language table
//! ([`PluralRule::for_language`]) or from a compiled `Plural-Forms`
//! expression ([`PluralRule::compile`]).

pub mod expression;

use std::{collections::HashMap, fmt::Display};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

pub use expression::PluralExpression;

use crate::error::Error;

lazy_static! {
    /// Language subtag (or `language-REGION`) → plural rule.
    static ref RULE_TABLE: HashMap<&'static str, PluralRule> = {
        use PluralRule::*;
        let mut m = HashMap::new();

        for code in [
            "ja", "zh", "ko", "vi", "th", "lo", "km", "my", "id", "ms", "bo", "dz", "ka", "jv",
            "su", "yue", "ii", "wo", "yo", "ig",
        ] {
            m.insert(code, Single);
        }

        for code in [
            "en", "de", "nl", "sv", "da", "no", "nb", "nn", "fo", "es", "pt", "it", "bg", "el",
            "fi", "et", "he", "iw", "eo", "hu", "tr", "ca", "eu", "gl", "af", "sw", "ur", "hi",
            "bn", "gu", "ta", "te", "kn", "ml", "mr", "ne", "pa", "sq", "az", "kk", "ky", "mn",
            "so", "ps", "fy", "lb", "ast", "nso", "rm", "si", "tk", "ug", "uz", "xh", "zu",
        ] {
            m.insert(code, OneOther);
        }

        for code in [
            "fr", "oc", "br", "fil", "tl", "ln", "mg", "ak", "am", "ti", "wa", "fa", "hy", "kab",
            "pt-BR",
        ] {
            m.insert(code, ZeroOne);
        }

        for code in ["ru", "uk", "be", "sr", "hr", "bs", "sh"] {
            m.insert(code, EastSlavic);
        }
        for code in ["cs", "sk"] {
            m.insert(code, Czech);
        }
        for code in ["ro", "mo"] {
            m.insert(code, Romanian);
        }

        m.insert("pl", Polish);
        m.insert("sl", Slovenian);
        m.insert("lt", Lithuanian);
        m.insert("lv", Latvian);
        m.insert("ga", Irish);
        m.insert("ar", Arabic);
        m.insert("is", Icelandic);
        m.insert("mk", Macedonian);
        m.insert("cy", Welsh);
        m.insert("mt", Maltese);

        m
    };
}

/// Where a catalog takes its plural rule from, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluralSource {
    /// A `Plural-Forms` header value or bare expression.
    Expression(String),
    /// A language tag looked up in the built-in table.
    Language(String),
    /// Nothing known: a single form is used.
    Unknown,
}

impl PluralSource {
    /// Resolves the source into a rule. Only expressions can fail.
    pub fn resolve(&self) -> Result<PluralRule, Error> {
        match self {
            PluralSource::Expression(source) => PluralRule::compile(source),
            PluralSource::Language(tag) => Ok(PluralRule::for_language(tag)),
            PluralSource::Unknown => Ok(PluralRule::default()),
        }
    }
}

/// A plural selector: a closed set of well-known rule shapes plus compiled
/// expressions.
///
/// Each variant documents its gettext `plural=` equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluralRule {
    /// `0`
    #[default]
    Single,
    /// `n != 1`
    OneOther,
    /// `n > 1`
    ZeroOne,
    /// `n%10==1 && n%100!=11 ? 0 : n != 0 ? 1 : 2`
    Latvian,
    /// `n==1 ? 0 : n==2 ? 1 : (n>2 && n<7) ? 2 : (n>6 && n<11) ? 3 : 4`
    Irish,
    /// `n==1 ? 0 : (n==0 || (n%100 > 0 && n%100 < 20)) ? 1 : 2`
    Romanian,
    /// `n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2`
    Lithuanian,
    /// `n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2`
    EastSlavic,
    /// `n==1 ? 0 : (n>=2 && n<=4) ? 1 : 2`
    Czech,
    /// `n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2`
    Polish,
    /// `n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3`
    Slovenian,
    /// `n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5`
    Arabic,
    /// `n%10!=1 || n%100==11`
    Icelandic,
    /// `n==1 || n%10==1 ? 0 : 1`
    Macedonian,
    /// `n==1 ? 0 : n==2 ? 1 : (n != 8 && n != 11) ? 2 : 3`
    Welsh,
    /// `n==1 ? 0 : n==0 || (n%100>1 && n%100<11) ? 1 : (n%100>10 && n%100<20) ? 2 : 3`
    Maltese,
    /// A compiled `Plural-Forms` expression.
    Expression(PluralExpression),
}

impl PluralRule {
    /// The rule English uses; also the last-resort fallback of every lookup.
    pub const ENGLISH: PluralRule = PluralRule::OneOther;

    /// Compiles a `Plural-Forms` header value or a bare expression.
    pub fn compile(source: &str) -> Result<Self, Error> {
        PluralExpression::compile(source).map(PluralRule::Expression)
    }

    /// Looks up the rule for a language tag. Never fails: unknown or
    /// unparsable tags get [`PluralRule::Single`].
    pub fn for_language(tag: &str) -> Self {
        let Some(lang) = parse_language_tag(tag) else {
            return PluralRule::Single;
        };
        let base = lang.language.as_str();
        let regional = lang.region.map(|region| format!("{}-{}", base, region.as_str()));

        regional
            .as_deref()
            .and_then(|key| RULE_TABLE.get(key))
            .or_else(|| RULE_TABLE.get(base))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the rule table has an entry for the base language of `tag`.
    pub fn is_known_language(tag: &str) -> bool {
        parse_language_tag(tag).is_some_and(|lang| RULE_TABLE.contains_key(lang.language.as_str()))
    }

    /// Selects the plural form index for `n`. Total over all inputs.
    pub fn select(&self, n: u64) -> usize {
        let (m10, m100) = (n % 10, n % 100);
        match self {
            PluralRule::Single => 0,
            PluralRule::OneOther => usize::from(n != 1),
            PluralRule::ZeroOne => usize::from(n > 1),
            PluralRule::Latvian => {
                if m10 == 1 && m100 != 11 {
                    0
                } else if n != 0 {
                    1
                } else {
                    2
                }
            }
            PluralRule::Irish => match n {
                1 => 0,
                2 => 1,
                3..=6 => 2,
                7..=10 => 3,
                _ => 4,
            },
            PluralRule::Romanian => {
                if n == 1 {
                    0
                } else if n == 0 || (1..20).contains(&m100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Lithuanian => {
                if m10 == 1 && m100 != 11 {
                    0
                } else if m10 >= 2 && !(10..20).contains(&m100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::EastSlavic => {
                if m10 == 1 && m100 != 11 {
                    0
                } else if (2..=4).contains(&m10) && !(10..20).contains(&m100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Czech => match n {
                1 => 0,
                2..=4 => 1,
                _ => 2,
            },
            PluralRule::Polish => {
                if n == 1 {
                    0
                } else if (2..=4).contains(&m10) && !(10..20).contains(&m100) {
                    1
                } else {
                    2
                }
            }
            PluralRule::Slovenian => match m100 {
                1 => 0,
                2 => 1,
                3 | 4 => 2,
                _ => 3,
            },
            PluralRule::Arabic => match n {
                0 => 0,
                1 => 1,
                2 => 2,
                _ if (3..=10).contains(&m100) => 3,
                _ if m100 >= 11 => 4,
                _ => 5,
            },
            PluralRule::Icelandic => usize::from(m10 != 1 || m100 == 11),
            PluralRule::Macedonian => usize::from(!(n == 1 || m10 == 1)),
            PluralRule::Welsh => match n {
                1 => 0,
                2 => 1,
                8 | 11 => 3,
                _ => 2,
            },
            PluralRule::Maltese => {
                if n == 1 {
                    0
                } else if n == 0 || (2..11).contains(&m100) {
                    1
                } else if (11..20).contains(&m100) {
                    2
                } else {
                    3
                }
            }
            PluralRule::Expression(expr) => {
                usize::try_from(expr.evaluate(n)).unwrap_or(usize::MAX)
            }
        }
    }

    /// Number of plural forms this rule distinguishes. Bare expressions
    /// without a declared `nplurals` report the gettext default of 2.
    pub fn nplurals(&self) -> usize {
        match self {
            PluralRule::Single => 1,
            PluralRule::OneOther
            | PluralRule::ZeroOne
            | PluralRule::Icelandic
            | PluralRule::Macedonian => 2,
            PluralRule::Latvian
            | PluralRule::Romanian
            | PluralRule::Lithuanian
            | PluralRule::EastSlavic
            | PluralRule::Czech
            | PluralRule::Polish => 3,
            PluralRule::Slovenian | PluralRule::Welsh | PluralRule::Maltese => 4,
            PluralRule::Irish => 5,
            PluralRule::Arabic => 6,
            PluralRule::Expression(expr) => expr.nplurals().unwrap_or(2),
        }
    }
}

impl Display for PluralRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluralRule::Expression(expr) => write!(f, "expression `{}`", expr),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Normalizes a POSIX-style locale (`pt_BR.UTF-8@euro`) into a language
/// identifier. Returns `None` for empty or unparsable tags such as `??`.
pub fn parse_language_tag(tag: &str) -> Option<LanguageIdentifier> {
    let tag = tag.split(['.', '@']).next().unwrap_or_default().trim();
    if tag.is_empty() {
        return None;
    }
    tag.replace('_', "-").parse().ok()
}

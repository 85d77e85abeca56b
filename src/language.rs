// ============================================
// src/language.rs
// Supported languages and per-language containers
// ============================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two locales every quiz is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Language {
    #[serde(rename = "en-US")]
    #[value(name = "en-US")]
    EnUs,
    #[serde(rename = "es-MX")]
    #[value(name = "es-MX")]
    EsMx,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::EnUs, Language::EsMx];

    /// BCP 47 tag as written in the quiz files
    pub fn tag(self) -> &'static str {
        match self {
            Language::EnUs => "en-US",
            Language::EsMx => "es-MX",
        }
    }

    pub fn other(self) -> Language {
        match self {
            Language::EnUs => Language::EsMx,
            Language::EsMx => Language::EnUs,
        }
    }

    /// Name of the language written in that same language
    pub fn native_name(self) -> &'static str {
        match self {
            Language::EnUs => "English",
            Language::EsMx => "Español",
        }
    }

    /// Picks the string matching this language.
    pub fn pick<'a>(self, en: &'a str, es: &'a str) -> &'a str {
        match self {
            Language::EnUs => en,
            Language::EsMx => es,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One value per supported language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Localized<T> {
    pub en_us: T,
    pub es_mx: T,
}

impl<T> Localized<T> {
    pub fn new(en_us: T, es_mx: T) -> Self {
        Self { en_us, es_mx }
    }

    pub fn get(&self, language: Language) -> &T {
        match language {
            Language::EnUs => &self.en_us,
            Language::EsMx => &self.es_mx,
        }
    }

    /// Builds both values with the same fallible closure, stopping at the first error.
    pub fn try_build<E>(mut f: impl FnMut(Language) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            en_us: f(Language::EnUs)?,
            es_mx: f(Language::EsMx)?,
        })
    }
}

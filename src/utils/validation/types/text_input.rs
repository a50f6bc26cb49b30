//! Texte libre saisi par le personnel: noms, titres, consignes.
//!
//! Input is trimmed and NFKC-normalised. Markup and control characters are
//! refused, so stored text can be echoed back to clients as is.

use std::fmt;

use ammonia::is_html;
use anyhow::{bail, Result};
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;
use validator::ValidateNonControlCharacter;

use crate::utils::validation::{MAX_CONTENT_LENGTH, MAX_SHORT_CONTENT_LENGTH};

/// Texte validé d'au plus `MAX` caractères (forme courte par défaut).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct TextInput<const MAX: usize = MAX_SHORT_CONTENT_LENGTH>(String);

/// Descriptions, consignes et autres contenus longs
pub type LongTextInput = TextInput<MAX_CONTENT_LENGTH>;

impl<const MAX: usize> TextInput<MAX> {
    pub fn new(raw: &str) -> Result<Self> {
        let text: String = raw.trim().nfkc().collect();

        if text.is_empty() {
            bail!("Text cannot be blank");
        }
        let length = text.chars().count();
        if length > MAX {
            bail!("Text is {length} characters long, at most {MAX} allowed");
        }
        if !text.validate_non_control_character() {
            bail!("Text contains control characters");
        }
        if is_html(&text) {
            bail!("Text cannot contain markup");
        }

        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<const MAX: usize> TryFrom<String> for TextInput<MAX> {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl<const MAX: usize> fmt::Display for TextInput<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

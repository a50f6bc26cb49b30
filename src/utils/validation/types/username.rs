//! Wrapper type for a username that has been validated

use anyhow::{bail, Result};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

// Letter first, then letters, digits or underscores; 3 to 50 characters
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]{2,49}$").expect("Failed to compile username regex")
});

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Deserialize)]
#[serde(try_from = "String")]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = anyhow::Error;

    fn try_from(username: String) -> Result<Self> {
        if !USERNAME_REGEX.is_match(&username) {
            bail!("Invalid username");
        }
        Ok(Self(username))
    }
}

impl TryFrom<&str> for Username {
    type Error = anyhow::Error;

    fn try_from(username: &str) -> Result<Self> {
        Self::try_from(username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

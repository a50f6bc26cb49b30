//! Plaintext password as received at registration.
//!
//! Only the length is checked here; the content never leaves this wrapper
//! except to be hashed, and `Debug` output is redacted.

use anyhow::{bail, Result};
use serde::Deserialize;
use std::fmt;

use crate::utils::validation::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

#[derive(Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct PasswordInput(String);

impl PasswordInput {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PasswordInput {
    type Error = anyhow::Error;

    fn try_from(password: String) -> Result<Self> {
        let length = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            bail!(
                "Password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH,
                MAX_PASSWORD_LENGTH
            );
        }
        Ok(Self(password))
    }
}

impl fmt::Debug for PasswordInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordInput(***)")
    }
}

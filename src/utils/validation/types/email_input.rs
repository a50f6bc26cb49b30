//! Adresse e-mail validée, stockée en minuscules.

use std::fmt;

use anyhow::{bail, Result};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::utils::validation::MAX_EMAIL_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct EmailInput(String);

impl EmailInput {
    pub fn new(raw: &str) -> Result<Self> {
        let address = raw.trim().to_lowercase();

        if address.len() > MAX_EMAIL_LENGTH {
            bail!("Email address longer than {MAX_EMAIL_LENGTH} bytes");
        }
        if !address.validate_email() {
            bail!("Invalid email address");
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailInput {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl fmt::Display for EmailInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

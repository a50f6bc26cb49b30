//! Hachage et vérification des mots de passe

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHashString, PasswordVerifier, SaltString},
    Argon2, PasswordHasher,
};
use derive_more::derive::Display;
use std::{str::FromStr, sync::LazyLock};
use thiserror::Error;

static DEFAULT_HASHER: LazyLock<Argon2<'static>> = LazyLock::new(Argon2::default);

/// Le hash d'un mot de passe vide, à utiliser quand l'utilisateur n'existe pas
/// pour éviter une attaque par canal auxiliaire
static EMPTY_HASH: LazyLock<Option<PWHash>> = LazyLock::new(|| hash("").ok());

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid PHC string")]
    InvalidHash,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Un mot de passe haché, stocké au format PHC
#[derive(Clone, Debug, Display)]
pub struct PWHash(PasswordHashString);

impl PWHash {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::hash::Hash for PWHash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state)
    }
}

impl TryFrom<String> for PWHash {
    type Error = PasswordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PasswordHashString::from_str(&value)
            .map(PWHash)
            .map_err(|_| PasswordError::InvalidHash)
    }
}

/// Calcule un haché a partir d'un mot de passe en clair, en choisissant un sel au hasard
pub fn hash(password: &str) -> Result<PWHash, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = DEFAULT_HASHER
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
        .serialize();

    Ok(PWHash(hash))
}

/// Vérifie si le mot de passe correspond au hash stocké.
///
/// Sans hash (utilisateur inconnu), le mot de passe est quand même testé
/// contre un faux hash et la vérification échoue toujours.
pub fn verify(password: &str, maybe_hash: Option<&PWHash>) -> bool {
    let known = maybe_hash.is_some();
    let Some(hash) = maybe_hash.or(EMPTY_HASH.as_ref()) else {
        return false;
    };

    let matches = DEFAULT_HASHER
        .verify_password(password.as_bytes(), &hash.0.password_hash())
        .is_ok();

    known && matches
}

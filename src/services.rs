//! API d'accès aux données, et point d'entrée unique pour le contrôle d'accès.
//!
//! Every operation takes the connection of the request's transaction, so the
//! caller decides when to commit.

/// Appends `, column = ?` to an UPDATE builder when the patch carries a value.
macro_rules! set_field {
    ($query:expr, $column:literal, $value:expr) => {
        if let Some(value) = $value {
            $query.push(concat!(", ", $column, " = ")).push_bind(value);
        }
    };
}

pub mod appointments;
pub mod assignments;
pub mod auth;
pub mod health_plans;
pub mod health_records;
pub mod patients;

use serde::Deserialize;
use thiserror::Error;

use crate::authorization::AccessDenied;
use crate::consts::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::utils::error_messages::{CONFLICT, INSUFFICIENT_PERMISSIONS, INVALID_PAGE};
use crate::utils::password_utils::PasswordError;
use crate::utils::token::TokenError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Mauvais mot de passe ou utilisateur inconnu")]
    InvalidCredentials,

    #[error("Utilisateur inactif")]
    InactiveUser,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    InUse(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<AccessDenied> for ServiceError {
    fn from(_: AccessDenied) -> Self {
        ServiceError::Forbidden(INSUFFICIENT_PERMISSIONS)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Pagination parameters shared by every listing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn validate(self) -> ServiceResult<Self> {
        if self.skip < 0 || !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(ServiceError::Validation(INVALID_PAGE.to_owned()));
        }
        Ok(self)
    }
}

/// Case-insensitive `REGEXP` pattern matching `needle` anywhere in a column.
/// SQLite's own `LIKE` and `LOWER` only fold ASCII letters.
fn contains(needle: &str) -> String {
    format!("(?i){}", regex::escape(needle))
}

/// Unique columns of a table with the conflict message each one reports.
/// The first entry answers when the database names none of them.
type UniqueKeys = &'static [(&'static str, &'static str)];

/// Maps a unique-constraint violation to `Conflict`, with the message of the
/// column the database reports.
fn unique_violation(keys: UniqueKeys) -> impl FnOnce(sqlx::Error) -> ServiceError {
    move |err| {
        let conflict = err
            .as_database_error()
            .filter(|e| e.is_unique_violation())
            .map(|e| conflict_message(e.message(), keys));
        match conflict {
            Some(message) => ServiceError::Conflict(message),
            None => ServiceError::Database(err),
        }
    }
}

/// SQLite words these `UNIQUE constraint failed: table.col1, table.col2`.
fn conflict_message(db_message: &str, keys: UniqueKeys) -> &'static str {
    let columns: Vec<&str> = db_message
        .rsplit(": ")
        .next()
        .unwrap_or_default()
        .split(", ")
        .filter_map(|qualified| qualified.rsplit('.').next())
        .collect();

    keys.iter()
        .find(|(column, _)| columns.contains(column))
        .or_else(|| keys.first())
        .map_or(CONFLICT, |&(_, message)| message)
}

/// Empty optional strings are stored as NULL.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds() {
        assert!(Page::default().validate().is_ok());
        assert!(Page { skip: -1, limit: 10 }.validate().is_err());
        assert!(Page { skip: 0, limit: 0 }.validate().is_err());
        assert!(Page { skip: 0, limit: MAX_PAGE_LIMIT }.validate().is_ok());
        assert!(Page { skip: 0, limit: MAX_PAGE_LIMIT + 1 }.validate().is_err());
    }

    #[test]
    fn search_pattern_is_literal_and_case_blind() {
        assert_eq!(contains("SmiTh"), "(?i)SmiTh");
        assert_eq!(contains("(home) 555"), r"(?i)\(home\) 555");

        let pattern = regex::Regex::new(&contains("émile")).unwrap();
        assert!(pattern.is_match("Dr ÉMILE Zola"));
        assert!(!regex::Regex::new(&contains("a.c")).unwrap().is_match("abc"));
    }

    const PATIENT_KEYS: UniqueKeys = &[
        ("patient_id", "patient id taken"),
        ("id_card", "id card taken"),
    ];

    #[test]
    fn conflict_names_the_violated_column() {
        assert_eq!(
            conflict_message("UNIQUE constraint failed: patients.id_card", PATIENT_KEYS),
            "id card taken"
        );
        assert_eq!(
            conflict_message("UNIQUE constraint failed: patients.patient_id", PATIENT_KEYS),
            "patient id taken"
        );
        assert_eq!(
            conflict_message(
                "UNIQUE constraint failed: patient_health_plans.patient_id, patient_health_plans.health_plan_id",
                &[("health_plan_id", "assigned")]
            ),
            "assigned"
        );
        assert_eq!(
            conflict_message("UNIQUE constraint failed: index 'x'", PATIENT_KEYS),
            "patient id taken"
        );
        assert_eq!(conflict_message("UNIQUE constraint failed: t.c", &[]), CONFLICT);
    }

    #[test]
    fn blank_strings_become_null() {
        assert_eq!(non_empty(Some("  ".to_owned())), None);
        assert_eq!(non_empty(Some(" X1 ".to_owned())), Some("X1".to_owned()));
        assert_eq!(non_empty(None), None);
    }
}

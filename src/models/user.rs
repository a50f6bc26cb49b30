use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use super::RowId;
use crate::utils::password_utils::PWHash;
use crate::utils::validation::{EmailInput, PasswordInput, TextInput, Username};

/// Role d'un utilisateur: Admin, Médecin ou Infirmier
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    #[display("admin")]
    Admin,
    #[display("doctor")]
    Doctor,
    #[display("nurse")]
    Nurse,
}

/// A staff account. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Hash, sqlx::FromRow)]
pub struct User {
    pub id: RowId,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    #[sqlx(try_from = "String")]
    pub hashed_password: PWHash,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub department: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub username: Username,
    pub email: EmailInput,
    pub password: PasswordInput,
    pub full_name: TextInput,
    pub phone: Option<String>,
    pub role: Role,
    pub specialty: Option<String>,
    pub license_number: Option<String>,
    pub department: Option<String>,
}

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use super::RowId;
use crate::utils::validation::{EmailInput, TextInput};

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Gender {
    #[display("male")]
    Male,
    #[display("female")]
    Female,
    #[display("other")]
    Other,
}

/// A patient record. `patient_id` is the business key shown to staff;
/// `id_card` is the optional national identifier.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Patient {
    pub id: RowId,
    pub patient_id: String,
    pub name: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_card: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewPatient {
    pub patient_id: TextInput,
    pub name: TextInput,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub phone: Option<String>,
    pub email: Option<EmailInput>,
    pub id_card: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct PatientPatch {
    pub name: Option<TextInput>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<EmailInput>,
    pub id_card: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub is_active: Option<bool>,
}

/// Listing filters. Text filters match case-insensitive substrings.
#[derive(Debug, Deserialize)]
pub struct PatientFilter {
    pub name: Option<String>,
    pub patient_id: Option<String>,
    pub phone: Option<String>,
    pub id_card: Option<String>,
    #[serde(default = "active_only")]
    pub is_active: bool,
}

fn active_only() -> bool {
    true
}

impl Default for PatientFilter {
    fn default() -> Self {
        Self {
            name: None,
            patient_id: None,
            phone: None,
            id_card: None,
            is_active: true,
        }
    }
}

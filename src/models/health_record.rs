use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use super::RowId;
use crate::utils::validation::{LongTextInput, TextInput};

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RecordType {
    #[display("vital_signs")]
    VitalSigns,
    #[display("lab_result")]
    LabResult,
    #[display("examination")]
    Examination,
    #[display("medication")]
    Medication,
    #[display("symptom")]
    Symptom,
    #[display("progress")]
    Progress,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HealthRecord {
    pub id: RowId,
    pub patient_id: RowId,
    pub recorded_by: RowId,
    pub patient_health_plan_id: Option<RowId>,
    pub record_type: RecordType,
    pub title: String,
    pub description: Option<String>,
    pub systolic_pressure: Option<f64>,
    pub diastolic_pressure: Option<f64>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub test_name: Option<String>,
    pub test_value: Option<String>,
    pub test_unit: Option<String>,
    pub reference_range: Option<String>,
    pub severity_level: Option<i64>,
    pub medication_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub record_date: DateTime<Utc>,
    pub event_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Subset of a record that the ownership policy looks at.
#[derive(Debug, Serialize, Hash)]
pub struct RecordRef {
    pub id: RowId,
    pub recorded_by: RowId,
}

impl From<&HealthRecord> for RecordRef {
    fn from(record: &HealthRecord) -> Self {
        Self {
            id: record.id,
            recorded_by: record.recorded_by,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewHealthRecord {
    pub patient_id: RowId,
    pub patient_health_plan_id: Option<RowId>,
    pub record_type: RecordType,
    pub title: TextInput,
    pub description: Option<LongTextInput>,
    pub systolic_pressure: Option<f64>,
    pub diastolic_pressure: Option<f64>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub test_name: Option<String>,
    pub test_value: Option<String>,
    pub test_unit: Option<String>,
    pub reference_range: Option<String>,
    pub severity_level: Option<i64>,
    pub medication_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub record_date: DateTime<Utc>,
    pub event_date: Option<DateTime<Utc>>,
}

/// Clinical payload only; patient, type and author never change.
#[derive(Debug, Default, Deserialize)]
pub struct HealthRecordPatch {
    pub title: Option<TextInput>,
    pub description: Option<LongTextInput>,
    pub systolic_pressure: Option<f64>,
    pub diastolic_pressure: Option<f64>,
    pub heart_rate: Option<f64>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<f64>,
    pub blood_glucose: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub test_name: Option<String>,
    pub test_value: Option<String>,
    pub test_unit: Option<String>,
    pub reference_range: Option<String>,
    pub severity_level: Option<i64>,
    pub medication_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub record_date: Option<DateTime<Utc>>,
    pub event_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthRecordFilter {
    pub patient_id: Option<RowId>,
    pub record_type: Option<RecordType>,
    pub recorded_by: Option<RowId>,
    pub patient_health_plan_id: Option<RowId>,
    pub record_date_from: Option<DateTime<Utc>>,
    pub record_date_to: Option<DateTime<Utc>>,
}

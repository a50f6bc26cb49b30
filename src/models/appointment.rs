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
pub enum AppointmentType {
    #[display("consultation")]
    Consultation,
    #[display("follow_up")]
    FollowUp,
    #[display("examination")]
    Examination,
    #[display("treatment")]
    Treatment,
    #[display("emergency")]
    Emergency,
}

#[derive(
    Debug,
    Default,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    Display,
    sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    #[display("scheduled")]
    Scheduled,
    #[display("confirmed")]
    Confirmed,
    #[display("in_progress")]
    InProgress,
    #[display("completed")]
    Completed,
    #[display("cancelled")]
    Cancelled,
    #[display("no_show")]
    NoShow,
}

/// Rendez-vous entre un patient et un médecin
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: RowId,
    pub patient_id: RowId,
    pub doctor_id: RowId,
    pub patient_health_plan_id: Option<RowId>,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub title: String,
    pub description: Option<String>,
    pub reason: Option<String>,
    pub chief_complaint: Option<String>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub estimated_cost: Option<String>,
    pub actual_cost: Option<String>,
    pub reminder_sent: bool,
    pub reminder_time: Option<DateTime<Utc>>,
    pub doctor_notes: Option<String>,
    pub patient_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewAppointment {
    pub patient_id: RowId,
    pub doctor_id: RowId,
    pub patient_health_plan_id: Option<RowId>,
    pub appointment_type: AppointmentType,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub title: TextInput,
    pub description: Option<LongTextInput>,
    pub reason: Option<String>,
    pub chief_complaint: Option<String>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub estimated_cost: Option<String>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub patient_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentPatch {
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub title: Option<TextInput>,
    pub description: Option<LongTextInput>,
    pub reason: Option<String>,
    pub chief_complaint: Option<String>,
    pub location: Option<String>,
    pub room_number: Option<String>,
    pub estimated_cost: Option<String>,
    pub actual_cost: Option<String>,
    pub reminder_sent: Option<bool>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub doctor_notes: Option<String>,
    pub patient_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentFilter {
    pub patient_id: Option<RowId>,
    pub doctor_id: Option<RowId>,
    pub appointment_type: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub patient_health_plan_id: Option<RowId>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelAppointment {
    pub cancellation_reason: Option<String>,
}

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::RowId;

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
pub enum AssignmentStatus {
    #[default]
    #[display("assigned")]
    Assigned,
    #[display("in_progress")]
    InProgress,
    #[display("completed")]
    Completed,
    #[display("paused")]
    Paused,
    #[display("cancelled")]
    Cancelled,
}

impl AssignmentStatus {
    /// Active assignments block duplicates and plan deletion.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// SQL condition on a `status` column selecting the active statuses,
    /// e.g. `status IN ('assigned', 'in_progress')`.
    pub fn active_condition() -> String {
        let active: Vec<String> = Self::iter()
            .filter(|status| status.is_active())
            .map(|status| format!("'{status}'"))
            .collect();
        format!("status IN ({})", active.join(", "))
    }
}

/// Attribution d'un plan de santé à un patient
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: RowId,
    pub patient_id: RowId,
    pub health_plan_id: RowId,
    pub assigned_by: RowId,
    pub status: AssignmentStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub custom_instructions: Option<String>,
    pub custom_objectives: Option<String>,
    pub notes: Option<String>,
    pub completion_percentage: i64,
    pub last_check_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewAssignment {
    pub patient_id: RowId,
    pub health_plan_id: RowId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub custom_instructions: Option<String>,
    pub custom_objectives: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentPatch {
    pub status: Option<AssignmentStatus>,
    pub end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub custom_instructions: Option<String>,
    pub custom_objectives: Option<String>,
    pub notes: Option<String>,
    pub completion_percentage: Option<i64>,
    pub last_check_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentFilter {
    pub patient_id: Option<RowId>,
    pub health_plan_id: Option<RowId>,
    pub assigned_by: Option<RowId>,
    pub status: Option<AssignmentStatus>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatientAssignmentsFilter {
    pub status: Option<AssignmentStatus>,
}

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
pub enum PlanType {
    #[display("diet")]
    Diet,
    #[display("exercise")]
    Exercise,
    #[display("medication")]
    Medication,
    #[display("lifestyle")]
    Lifestyle,
    #[display("rehabilitation")]
    Rehabilitation,
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
pub enum PlanStatus {
    #[default]
    #[display("draft")]
    Draft,
    #[display("active")]
    Active,
    #[display("paused")]
    Paused,
    #[display("completed")]
    Completed,
    #[display("cancelled")]
    Cancelled,
}

/// Un plan de santé. Visible par son créateur et les admins, et par tous
/// les autres utilisateurs seulement s'il est public.
#[derive(Debug, Clone, Serialize, Hash, sqlx::FromRow)]
pub struct HealthPlan {
    pub id: RowId,
    pub title: String,
    pub description: Option<String>,
    pub plan_type: PlanType,
    pub status: PlanStatus,
    pub objectives: Option<String>,
    pub instructions: String,
    pub duration_days: Option<i64>,
    pub frequency: Option<String>,
    pub target_conditions: Option<String>,
    pub contraindications: Option<String>,
    pub age_range_min: Option<i64>,
    pub age_range_max: Option<i64>,
    pub created_by: RowId,
    pub is_template: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewHealthPlan {
    pub title: TextInput,
    pub description: Option<LongTextInput>,
    pub plan_type: PlanType,
    pub objectives: Option<String>,
    pub instructions: LongTextInput,
    pub duration_days: Option<i64>,
    pub frequency: Option<String>,
    pub target_conditions: Option<String>,
    pub contraindications: Option<String>,
    pub age_range_min: Option<i64>,
    pub age_range_max: Option<i64>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthPlanPatch {
    pub title: Option<TextInput>,
    pub description: Option<LongTextInput>,
    pub plan_type: Option<PlanType>,
    pub status: Option<PlanStatus>,
    pub objectives: Option<String>,
    pub instructions: Option<LongTextInput>,
    pub duration_days: Option<i64>,
    pub frequency: Option<String>,
    pub target_conditions: Option<String>,
    pub contraindications: Option<String>,
    pub age_range_min: Option<i64>,
    pub age_range_max: Option<i64>,
    pub is_template: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthPlanFilter {
    pub title: Option<String>,
    pub plan_type: Option<PlanType>,
    pub status: Option<PlanStatus>,
    pub is_template: Option<bool>,
    pub is_public: Option<bool>,
    pub created_by: Option<RowId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateFilter {
    pub plan_type: Option<PlanType>,
}

//! Attribution des plans de santé aux patients.
//!
//! A patient holds at most one active (assigned or in progress) assignment per
//! plan. The check runs before the insert and a partial unique index backs it.

use chrono::Utc;
use log::info;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{
    health_plans, patients, unique_violation, Page, ServiceError, ServiceResult, UniqueKeys,
};
use crate::authorization::require_role;
use crate::consts::PLAN_ASSIGNERS;
use crate::models::{
    Assignment, AssignmentFilter, AssignmentPatch, AssignmentStatus, NewAssignment, RowId, User,
};
use crate::utils::error_messages::{
    ASSIGNMENT_EXISTS, ASSIGNMENT_NOT_FOUND, INVALID_DATE_RANGE, INVALID_PERCENTAGE,
    PATIENT_NOT_FOUND, PLAN_NOT_FOUND,
};

const ASSIGNMENT_KEYS: UniqueKeys = &[("health_plan_id", ASSIGNMENT_EXISTS)];

pub async fn find(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Option<Assignment>> {
    Ok(sqlx::query_as("SELECT * FROM patient_health_plans WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

pub async fn get(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Assignment> {
    find(conn, id)
        .await?
        .ok_or(ServiceError::NotFound(ASSIGNMENT_NOT_FOUND))
}

/// Attribue un plan à un patient. Réservé aux médecins et aux admins.
pub async fn assign(
    conn: &mut SqliteConnection,
    assigner: &User,
    new: NewAssignment,
) -> ServiceResult<Assignment> {
    require_role(assigner, PLAN_ASSIGNERS)?;

    if new.end_date.is_some_and(|end| end < new.start_date) {
        return Err(ServiceError::Validation(INVALID_DATE_RANGE.to_owned()));
    }

    if patients::find(&mut *conn, new.patient_id).await?.is_none() {
        return Err(ServiceError::NotFound(PATIENT_NOT_FOUND));
    }
    if health_plans::find(&mut *conn, new.health_plan_id)
        .await?
        .is_none()
    {
        return Err(ServiceError::NotFound(PLAN_NOT_FOUND));
    }

    let duplicate = format!(
        "SELECT id FROM patient_health_plans WHERE patient_id = ? AND health_plan_id = ? AND {}",
        AssignmentStatus::active_condition()
    );
    let existing: Option<(RowId,)> = sqlx::query_as(&duplicate)
        .bind(new.patient_id)
        .bind(new.health_plan_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::Conflict(ASSIGNMENT_EXISTS));
    }

    let id = sqlx::query(
        "INSERT INTO patient_health_plans (patient_id, health_plan_id, assigned_by, status,
                                           start_date, end_date, custom_instructions,
                                           custom_objectives, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.patient_id)
    .bind(new.health_plan_id)
    .bind(assigner.id)
    .bind(AssignmentStatus::default())
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.custom_instructions)
    .bind(new.custom_objectives)
    .bind(new.notes)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(unique_violation(ASSIGNMENT_KEYS))?
    .last_insert_rowid();

    info!(
        "Plan {} attribué au patient {} par {}",
        new.health_plan_id, new.patient_id, assigner.username
    );
    get(conn, id).await
}

pub async fn list(
    conn: &mut SqliteConnection,
    filter: &AssignmentFilter,
    page: Page,
) -> ServiceResult<Vec<Assignment>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM patient_health_plans WHERE 1 = 1");

    if let Some(patient_id) = filter.patient_id {
        query.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(plan_id) = filter.health_plan_id {
        query.push(" AND health_plan_id = ").push_bind(plan_id);
    }
    if let Some(assigned_by) = filter.assigned_by {
        query.push(" AND assigned_by = ").push_bind(assigned_by);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.start_date_from {
        query.push(" AND start_date >= ").push_bind(from);
    }
    if let Some(to) = filter.start_date_to {
        query.push(" AND start_date <= ").push_bind(to);
    }

    query
        .push(" ORDER BY id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.skip);

    Ok(query.build_query_as::<Assignment>().fetch_all(conn).await?)
}

/// Caller-driven update. Any authenticated user may change any field present.
pub async fn update(
    conn: &mut SqliteConnection,
    id: RowId,
    patch: AssignmentPatch,
) -> ServiceResult<Assignment> {
    get(&mut *conn, id).await?;

    if patch
        .completion_percentage
        .is_some_and(|pct| !(0..=100).contains(&pct))
    {
        return Err(ServiceError::Validation(INVALID_PERCENTAGE.to_owned()));
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("UPDATE patient_health_plans SET updated_at = ");
    query.push_bind(Utc::now());

    set_field!(query, "status", patch.status);
    set_field!(query, "end_date", patch.end_date);
    set_field!(query, "actual_end_date", patch.actual_end_date);
    set_field!(query, "custom_instructions", patch.custom_instructions);
    set_field!(query, "custom_objectives", patch.custom_objectives);
    set_field!(query, "notes", patch.notes);
    set_field!(query, "completion_percentage", patch.completion_percentage);
    set_field!(query, "last_check_date", patch.last_check_date);

    query.push(" WHERE id = ").push_bind(id);
    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(unique_violation(ASSIGNMENT_KEYS))?;

    get(conn, id).await
}

pub async fn cancel(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Assignment> {
    let done = sqlx::query("UPDATE patient_health_plans SET status = ?, updated_at = ? WHERE id = ?")
        .bind(AssignmentStatus::Cancelled)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ServiceError::NotFound(ASSIGNMENT_NOT_FOUND));
    }

    info!("Attribution {id} annulée");
    get(conn, id).await
}

pub async fn list_for_patient(
    conn: &mut SqliteConnection,
    patient_id: RowId,
    status: Option<AssignmentStatus>,
) -> ServiceResult<Vec<Assignment>> {
    if patients::find(&mut *conn, patient_id).await?.is_none() {
        return Err(ServiceError::NotFound(PATIENT_NOT_FOUND));
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM patient_health_plans WHERE patient_id = ");
    query.push_bind(patient_id);
    if let Some(status) = status {
        query.push(" AND status = ").push_bind(status);
    }
    query.push(" ORDER BY id");

    Ok(query.build_query_as::<Assignment>().fetch_all(conn).await?)
}

//! Catalogue des plans de santé.
//!
//! Visibility and ownership go through the casbin policy; listings apply the
//! same predicate in SQL so pagination stays correct.

use chrono::Utc;
use log::{info, warn};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{contains, Page, ServiceError, ServiceResult};
use crate::authorization::Enforcer;
use crate::models::{
    AssignmentStatus, HealthPlan, HealthPlanFilter, HealthPlanPatch, NewHealthPlan, PlanStatus,
    RowId, TemplateFilter, User,
};
use crate::utils::error_messages::{
    INVALID_AGE_RANGE, INVALID_DURATION, PLAN_ACCESS_DENIED, PLAN_DELETE_DENIED, PLAN_IN_USE,
    PLAN_NOT_FOUND, PLAN_UPDATE_DENIED,
};

fn check_ranges(
    duration_days: Option<i64>,
    age_range_min: Option<i64>,
    age_range_max: Option<i64>,
) -> ServiceResult<()> {
    if duration_days.is_some_and(|days| days <= 0) {
        return Err(ServiceError::Validation(INVALID_DURATION.to_owned()));
    }
    if let (Some(min), Some(max)) = (age_range_min, age_range_max) {
        if min > max {
            return Err(ServiceError::Validation(INVALID_AGE_RANGE.to_owned()));
        }
    }
    Ok(())
}

pub async fn find(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Option<HealthPlan>> {
    Ok(sqlx::query_as("SELECT * FROM health_plans WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

async fn fetch(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<HealthPlan> {
    find(conn, id)
        .await?
        .ok_or(ServiceError::NotFound(PLAN_NOT_FOUND))
}

pub fn can_view(enforcer: &Enforcer, user: &User, plan: &HealthPlan) -> bool {
    enforcer.with_subject(user).view_plan(plan).is_ok()
}

/// Crée un plan en brouillon, possédé par `creator`.
pub async fn create(
    conn: &mut SqliteConnection,
    creator: &User,
    new: NewHealthPlan,
) -> ServiceResult<HealthPlan> {
    check_ranges(new.duration_days, new.age_range_min, new.age_range_max)?;

    let id = sqlx::query(
        "INSERT INTO health_plans (title, description, plan_type, status, objectives, instructions,
                                   duration_days, frequency, target_conditions, contraindications,
                                   age_range_min, age_range_max, created_by, is_template,
                                   is_public, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.title.as_str())
    .bind(new.description.map(|d| d.into_inner()))
    .bind(new.plan_type)
    .bind(PlanStatus::default())
    .bind(new.objectives)
    .bind(new.instructions.as_str())
    .bind(new.duration_days)
    .bind(new.frequency)
    .bind(new.target_conditions)
    .bind(new.contraindications)
    .bind(new.age_range_min)
    .bind(new.age_range_max)
    .bind(creator.id)
    .bind(new.is_template)
    .bind(new.is_public)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    info!("Plan {id} « {} » créé par {}", new.title, creator.username);
    fetch(conn, id).await
}

pub async fn get(
    conn: &mut SqliteConnection,
    enforcer: &Enforcer,
    requester: &User,
    id: RowId,
) -> ServiceResult<HealthPlan> {
    let plan = fetch(conn, id).await?;
    enforcer
        .with_subject(requester)
        .view_plan(&plan)
        .map_err(|_| ServiceError::Forbidden(PLAN_ACCESS_DENIED))?;
    Ok(plan)
}

/// Restricts non-admins to public plans and their own.
fn push_visibility(query: &mut QueryBuilder<'_, Sqlite>, requester: &User) {
    if !requester.is_admin() {
        query
            .push(" AND (is_public = 1 OR created_by = ")
            .push_bind(requester.id)
            .push(")");
    }
}

fn push_page(query: &mut QueryBuilder<'_, Sqlite>, page: Page) {
    query
        .push(" ORDER BY id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.skip);
}

pub async fn list(
    conn: &mut SqliteConnection,
    requester: &User,
    filter: &HealthPlanFilter,
    page: Page,
) -> ServiceResult<Vec<HealthPlan>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM health_plans WHERE 1 = 1");
    push_visibility(&mut query, requester);

    if let Some(title) = &filter.title {
        query.push(" AND title REGEXP ").push_bind(contains(title));
    }
    if let Some(plan_type) = filter.plan_type {
        query.push(" AND plan_type = ").push_bind(plan_type);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(is_template) = filter.is_template {
        query.push(" AND is_template = ").push_bind(is_template);
    }
    if let Some(is_public) = filter.is_public {
        query.push(" AND is_public = ").push_bind(is_public);
    }
    if let Some(created_by) = filter.created_by {
        query.push(" AND created_by = ").push_bind(created_by);
    }
    push_page(&mut query, page);

    Ok(query.build_query_as::<HealthPlan>().fetch_all(conn).await?)
}

/// Templates only. Non-admins see public templates, not their own private ones.
pub async fn list_templates(
    conn: &mut SqliteConnection,
    requester: &User,
    filter: &TemplateFilter,
    page: Page,
) -> ServiceResult<Vec<HealthPlan>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM health_plans WHERE is_template = 1");
    if !requester.is_admin() {
        query.push(" AND is_public = 1");
    }
    if let Some(plan_type) = filter.plan_type {
        query.push(" AND plan_type = ").push_bind(plan_type);
    }
    push_page(&mut query, page);

    Ok(query.build_query_as::<HealthPlan>().fetch_all(conn).await?)
}

pub async fn update(
    conn: &mut SqliteConnection,
    enforcer: &Enforcer,
    requester: &User,
    id: RowId,
    patch: HealthPlanPatch,
) -> ServiceResult<HealthPlan> {
    let current = fetch(&mut *conn, id).await?;
    enforcer
        .with_subject(requester)
        .update_plan(&current)
        .map_err(|_| ServiceError::Forbidden(PLAN_UPDATE_DENIED))?;

    check_ranges(
        patch.duration_days,
        patch.age_range_min.or(current.age_range_min),
        patch.age_range_max.or(current.age_range_max),
    )?;

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("UPDATE health_plans SET updated_at = ");
    query.push_bind(Utc::now());

    set_field!(query, "title", patch.title.map(|v| v.into_inner()));
    set_field!(query, "description", patch.description.map(|v| v.into_inner()));
    set_field!(query, "plan_type", patch.plan_type);
    set_field!(query, "status", patch.status);
    set_field!(query, "objectives", patch.objectives);
    set_field!(query, "instructions", patch.instructions.map(|v| v.into_inner()));
    set_field!(query, "duration_days", patch.duration_days);
    set_field!(query, "frequency", patch.frequency);
    set_field!(query, "target_conditions", patch.target_conditions);
    set_field!(query, "contraindications", patch.contraindications);
    set_field!(query, "age_range_min", patch.age_range_min);
    set_field!(query, "age_range_max", patch.age_range_max);
    set_field!(query, "is_template", patch.is_template);
    set_field!(query, "is_public", patch.is_public);

    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(&mut *conn).await?;

    fetch(conn, id).await
}

/// Supprime un plan sans attribution active. Les attributions terminées
/// ou annulées disparaissent avec lui.
pub async fn delete(
    conn: &mut SqliteConnection,
    enforcer: &Enforcer,
    requester: &User,
    id: RowId,
) -> ServiceResult<()> {
    let plan = fetch(&mut *conn, id).await?;
    enforcer
        .with_subject(requester)
        .delete_plan(&plan)
        .map_err(|_| ServiceError::Forbidden(PLAN_DELETE_DENIED))?;

    let count_active = format!(
        "SELECT COUNT(*) FROM patient_health_plans WHERE health_plan_id = ? AND {}",
        AssignmentStatus::active_condition()
    );
    let (active,): (i64,) = sqlx::query_as(&count_active)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    if active > 0 {
        warn!("Suppression du plan {id} refusée: {active} attribution(s) active(s)");
        return Err(ServiceError::InUse(PLAN_IN_USE));
    }

    sqlx::query("DELETE FROM health_plans WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    info!("Plan {id} supprimé par {}", requester.username);
    Ok(())
}

//! Catalogue des plans de santé. La visibilité et la propriété sont
//! vérifiées par les services via l'enforcer.

use axum::extract::State;

use crate::backend::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middlewares::CurrentUser;
use crate::backend::models::MessageResponse;
use crate::backend::state::AppState;
use crate::models::{
    HealthPlan, HealthPlanFilter, HealthPlanPatch, NewHealthPlan, RowId, TemplateFilter,
};
use crate::services::{health_plans, Page, ServiceResult};

pub async fn create_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(new): ApiJson<NewHealthPlan>,
) -> ServiceResult<ApiJson<HealthPlan>> {
    let mut tx = state.db.begin().await?;
    let plan = health_plans::create(&mut tx, &user, new).await?;
    tx.commit().await?;
    Ok(ApiJson(plan))
}

pub async fn list_plans(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
    ApiQuery(filter): ApiQuery<HealthPlanFilter>,
) -> ServiceResult<ApiJson<Vec<HealthPlan>>> {
    let page = page.validate()?;
    let mut tx = state.db.begin().await?;
    let plans = health_plans::list(&mut tx, &user, &filter, page).await?;
    tx.commit().await?;
    Ok(ApiJson(plans))
}

pub async fn list_templates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
    ApiQuery(filter): ApiQuery<TemplateFilter>,
) -> ServiceResult<ApiJson<Vec<HealthPlan>>> {
    let page = page.validate()?;
    let mut tx = state.db.begin().await?;
    let plans = health_plans::list_templates(&mut tx, &user, &filter, page).await?;
    tx.commit().await?;
    Ok(ApiJson(plans))
}

pub async fn get_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<HealthPlan>> {
    let mut tx = state.db.begin().await?;
    let plan = health_plans::get(&mut tx, &state.enforcer, &user, id).await?;
    tx.commit().await?;
    Ok(ApiJson(plan))
}

pub async fn update_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
    ApiJson(patch): ApiJson<HealthPlanPatch>,
) -> ServiceResult<ApiJson<HealthPlan>> {
    let mut tx = state.db.begin().await?;
    let plan = health_plans::update(&mut tx, &state.enforcer, &user, id, patch).await?;
    tx.commit().await?;
    Ok(ApiJson(plan))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<MessageResponse>> {
    let mut tx = state.db.begin().await?;
    health_plans::delete(&mut tx, &state.enforcer, &user, id).await?;
    tx.commit().await?;
    Ok(ApiJson(MessageResponse::new("Health plan deleted")))
}

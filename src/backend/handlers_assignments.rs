//! Attributions de plans aux patients.

use axum::extract::State;

use crate::backend::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middlewares::CurrentUser;
use crate::backend::models::MessageResponse;
use crate::backend::state::AppState;
use crate::models::{
    Assignment, AssignmentFilter, AssignmentPatch, NewAssignment, PatientAssignmentsFilter, RowId,
};
use crate::services::{assignments, Page, ServiceResult};

pub async fn assign_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(new): ApiJson<NewAssignment>,
) -> ServiceResult<ApiJson<Assignment>> {
    let mut tx = state.db.begin().await?;
    let assignment = assignments::assign(&mut tx, &user, new).await?;
    tx.commit().await?;
    Ok(ApiJson(assignment))
}

pub async fn list_assignments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
    ApiQuery(filter): ApiQuery<AssignmentFilter>,
) -> ServiceResult<ApiJson<Vec<Assignment>>> {
    let page = page.validate()?;
    let mut tx = state.db.begin().await?;
    let found = assignments::list(&mut tx, &filter, page).await?;
    tx.commit().await?;
    Ok(ApiJson(found))
}

pub async fn get_assignment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<Assignment>> {
    let mut tx = state.db.begin().await?;
    let assignment = assignments::get(&mut tx, id).await?;
    tx.commit().await?;
    Ok(ApiJson(assignment))
}

pub async fn update_assignment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
    ApiJson(patch): ApiJson<AssignmentPatch>,
) -> ServiceResult<ApiJson<Assignment>> {
    let mut tx = state.db.begin().await?;
    let assignment = assignments::update(&mut tx, id, patch).await?;
    tx.commit().await?;
    Ok(ApiJson(assignment))
}

pub async fn cancel_assignment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<MessageResponse>> {
    let mut tx = state.db.begin().await?;
    assignments::cancel(&mut tx, id).await?;
    tx.commit().await?;
    Ok(ApiJson(MessageResponse::new("Health plan assignment cancelled")))
}

pub async fn list_patient_assignments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(patient_id): ApiPath<RowId>,
    ApiQuery(filter): ApiQuery<PatientAssignmentsFilter>,
) -> ServiceResult<ApiJson<Vec<Assignment>>> {
    let mut tx = state.db.begin().await?;
    let found = assignments::list_for_patient(&mut tx, patient_id, filter.status).await?;
    tx.commit().await?;
    Ok(ApiJson(found))
}

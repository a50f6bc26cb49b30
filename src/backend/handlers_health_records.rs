//! Dossiers de santé.

use axum::extract::State;

use crate::backend::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middlewares::CurrentUser;
use crate::backend::models::MessageResponse;
use crate::backend::state::AppState;
use crate::models::{HealthRecord, HealthRecordFilter, HealthRecordPatch, NewHealthRecord, RowId};
use crate::services::{health_records, Page, ServiceResult};

pub async fn create_record(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(new): ApiJson<NewHealthRecord>,
) -> ServiceResult<ApiJson<HealthRecord>> {
    let mut tx = state.db.begin().await?;
    let record = health_records::create(&mut tx, &user, new).await?;
    tx.commit().await?;
    Ok(ApiJson(record))
}

pub async fn list_records(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
    ApiQuery(filter): ApiQuery<HealthRecordFilter>,
) -> ServiceResult<ApiJson<Vec<HealthRecord>>> {
    let page = page.validate()?;
    let mut tx = state.db.begin().await?;
    let found = health_records::list(&mut tx, &filter, page).await?;
    tx.commit().await?;
    Ok(ApiJson(found))
}

pub async fn get_record(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<HealthRecord>> {
    let mut tx = state.db.begin().await?;
    let record = health_records::get(&mut tx, id).await?;
    tx.commit().await?;
    Ok(ApiJson(record))
}

pub async fn update_record(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
    ApiJson(patch): ApiJson<HealthRecordPatch>,
) -> ServiceResult<ApiJson<HealthRecord>> {
    let mut tx = state.db.begin().await?;
    let record = health_records::update(&mut tx, id, patch).await?;
    tx.commit().await?;
    Ok(ApiJson(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<MessageResponse>> {
    let mut tx = state.db.begin().await?;
    health_records::delete(&mut tx, &state.enforcer, &user, id).await?;
    tx.commit().await?;
    Ok(ApiJson(MessageResponse::new("Health record deleted")))
}

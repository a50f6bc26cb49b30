//! Registre des patients.

use axum::extract::State;

use crate::backend::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middlewares::CurrentUser;
use crate::backend::models::{MessageResponse, SearchQuery};
use crate::backend::state::AppState;
use crate::models::{NewPatient, Patient, PatientFilter, PatientPatch, RowId};
use crate::services::{patients, Page, ServiceResult};

pub async fn create_patient(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiJson(new): ApiJson<NewPatient>,
) -> ServiceResult<ApiJson<Patient>> {
    let mut tx = state.db.begin().await?;
    let patient = patients::create(&mut tx, new).await?;
    tx.commit().await?;
    Ok(ApiJson(patient))
}

pub async fn list_patients(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
    ApiQuery(filter): ApiQuery<PatientFilter>,
) -> ServiceResult<ApiJson<Vec<Patient>>> {
    let page = page.validate()?;
    let mut tx = state.db.begin().await?;
    let found = patients::list(&mut tx, &filter, page).await?;
    tx.commit().await?;
    Ok(ApiJson(found))
}

pub async fn search_patients(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(search): ApiQuery<SearchQuery>,
) -> ServiceResult<ApiJson<Vec<Patient>>> {
    let mut tx = state.db.begin().await?;
    let found = patients::search(&mut tx, &search.query, search.limit).await?;
    tx.commit().await?;
    Ok(ApiJson(found))
}

pub async fn get_patient(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<Patient>> {
    let mut tx = state.db.begin().await?;
    let patient = patients::get(&mut tx, id).await?;
    tx.commit().await?;
    Ok(ApiJson(patient))
}

pub async fn update_patient(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
    ApiJson(patch): ApiJson<PatientPatch>,
) -> ServiceResult<ApiJson<Patient>> {
    let mut tx = state.db.begin().await?;
    let patient = patients::update(&mut tx, id, patch).await?;
    tx.commit().await?;
    Ok(ApiJson(patient))
}

/// Désactivation: le patient reste consultable par identifiant.
pub async fn delete_patient(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<MessageResponse>> {
    let mut tx = state.db.begin().await?;
    patients::soft_delete(&mut tx, id).await?;
    tx.commit().await?;
    Ok(ApiJson(MessageResponse::new("Patient deleted")))
}

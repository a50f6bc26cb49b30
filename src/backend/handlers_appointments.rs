//! Rendez-vous.

use axum::extract::State;

use crate::backend::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::backend::middlewares::CurrentUser;
use crate::backend::models::CancelResponse;
use crate::backend::state::AppState;
use crate::models::{
    Appointment, AppointmentFilter, AppointmentPatch, CancelAppointment, NewAppointment, RowId,
};
use crate::services::{appointments, Page, ServiceResult};

pub async fn schedule_appointment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiJson(new): ApiJson<NewAppointment>,
) -> ServiceResult<ApiJson<Appointment>> {
    let mut tx = state.db.begin().await?;
    let appointment = appointments::schedule(&mut tx, new).await?;
    tx.commit().await?;
    Ok(ApiJson(appointment))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiQuery(page): ApiQuery<Page>,
    ApiQuery(filter): ApiQuery<AppointmentFilter>,
) -> ServiceResult<ApiJson<Vec<Appointment>>> {
    let page = page.validate()?;
    let mut tx = state.db.begin().await?;
    let found = appointments::list(&mut tx, &filter, page).await?;
    tx.commit().await?;
    Ok(ApiJson(found))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
) -> ServiceResult<ApiJson<Appointment>> {
    let mut tx = state.db.begin().await?;
    let appointment = appointments::get(&mut tx, id).await?;
    tx.commit().await?;
    Ok(ApiJson(appointment))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
    ApiJson(patch): ApiJson<AppointmentPatch>,
) -> ServiceResult<ApiJson<Appointment>> {
    let mut tx = state.db.begin().await?;
    let appointment = appointments::update(&mut tx, id, patch).await?;
    tx.commit().await?;
    Ok(ApiJson(appointment))
}

/// Le corps `{cancellation_reason}` est facultatif.
pub async fn cancel_appointment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    ApiPath(id): ApiPath<RowId>,
    body: Option<ApiJson<CancelAppointment>>,
) -> ServiceResult<ApiJson<CancelResponse>> {
    let reason = body.and_then(|ApiJson(cancel)| cancel.cancellation_reason);

    let mut tx = state.db.begin().await?;
    let appointment = appointments::cancel(&mut tx, id, reason).await?;
    tx.commit().await?;
    Ok(ApiJson(CancelResponse {
        message: "Appointment cancelled".to_owned(),
        status: appointment.status,
    }))
}

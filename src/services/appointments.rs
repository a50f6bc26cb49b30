//! Rendez-vous patient / médecin.

use chrono::{DateTime, Utc};
use log::info;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{assignments, auth, non_empty, patients, Page, ServiceError, ServiceResult};
use crate::models::{
    Appointment, AppointmentFilter, AppointmentPatch, AppointmentStatus, NewAppointment, Role,
    RowId,
};
use crate::utils::error_messages::{
    APPOINTMENT_NOT_FOUND, ASSIGNMENT_NOT_FOUND, DOCTOR_NOT_FOUND, INVALID_TIME_WINDOW,
    NOT_A_DOCTOR, PATIENT_NOT_FOUND,
};

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> ServiceResult<()> {
    if end <= start {
        return Err(ServiceError::Validation(INVALID_TIME_WINDOW.to_owned()));
    }
    Ok(())
}

pub async fn find(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Option<Appointment>> {
    Ok(sqlx::query_as("SELECT * FROM appointments WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

pub async fn get(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Appointment> {
    find(conn, id)
        .await?
        .ok_or(ServiceError::NotFound(APPOINTMENT_NOT_FOUND))
}

/// Planifie un rendez-vous. Le praticien doit être un médecin actif.
pub async fn schedule(
    conn: &mut SqliteConnection,
    new: NewAppointment,
) -> ServiceResult<Appointment> {
    check_window(new.scheduled_start, new.scheduled_end)?;

    if patients::find(&mut *conn, new.patient_id).await?.is_none() {
        return Err(ServiceError::NotFound(PATIENT_NOT_FOUND));
    }

    let doctor = auth::get_user(&mut *conn, new.doctor_id)
        .await?
        .ok_or(ServiceError::NotFound(DOCTOR_NOT_FOUND))?;
    if doctor.role != Role::Doctor || !doctor.is_active {
        return Err(ServiceError::Validation(NOT_A_DOCTOR.to_owned()));
    }

    if let Some(assignment_id) = new.patient_health_plan_id {
        if assignments::find(&mut *conn, assignment_id).await?.is_none() {
            return Err(ServiceError::NotFound(ASSIGNMENT_NOT_FOUND));
        }
    }

    let id = sqlx::query(
        "INSERT INTO appointments (patient_id, doctor_id, patient_health_plan_id,
                                   appointment_type, status, scheduled_start, scheduled_end,
                                   title, description, reason, chief_complaint, location,
                                   room_number, estimated_cost, reminder_time, patient_notes,
                                   created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.patient_id)
    .bind(doctor.id)
    .bind(new.patient_health_plan_id)
    .bind(new.appointment_type)
    .bind(AppointmentStatus::default())
    .bind(new.scheduled_start)
    .bind(new.scheduled_end)
    .bind(new.title.as_str())
    .bind(new.description.map(|d| d.into_inner()))
    .bind(new.reason)
    .bind(new.chief_complaint)
    .bind(new.location)
    .bind(new.room_number)
    .bind(non_empty(new.estimated_cost))
    .bind(new.reminder_time)
    .bind(new.patient_notes)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    info!(
        "Rendez-vous {id} planifié: patient {} avec {} le {}",
        new.patient_id, doctor.username, new.scheduled_start
    );
    get(conn, id).await
}

/// Sorted by start time, earliest first.
pub async fn list(
    conn: &mut SqliteConnection,
    filter: &AppointmentFilter,
    page: Page,
) -> ServiceResult<Vec<Appointment>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM appointments WHERE 1 = 1");

    if let Some(patient_id) = filter.patient_id {
        query.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(doctor_id) = filter.doctor_id {
        query.push(" AND doctor_id = ").push_bind(doctor_id);
    }
    if let Some(appointment_type) = filter.appointment_type {
        query
            .push(" AND appointment_type = ")
            .push_bind(appointment_type);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(assignment_id) = filter.patient_health_plan_id {
        query
            .push(" AND patient_health_plan_id = ")
            .push_bind(assignment_id);
    }
    if let Some(from) = filter.scheduled_from {
        query.push(" AND scheduled_start >= ").push_bind(from);
    }
    if let Some(to) = filter.scheduled_to {
        query.push(" AND scheduled_start <= ").push_bind(to);
    }

    query
        .push(" ORDER BY scheduled_start ASC, id ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.skip);

    Ok(query.build_query_as::<Appointment>().fetch_all(conn).await?)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: RowId,
    patch: AppointmentPatch,
) -> ServiceResult<Appointment> {
    let current = get(&mut *conn, id).await?;
    check_window(
        patch.scheduled_start.unwrap_or(current.scheduled_start),
        patch.scheduled_end.unwrap_or(current.scheduled_end),
    )?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE appointments SET updated_at = ");
    query.push_bind(Utc::now());

    set_field!(query, "appointment_type", patch.appointment_type);
    set_field!(query, "status", patch.status);
    set_field!(query, "scheduled_start", patch.scheduled_start);
    set_field!(query, "scheduled_end", patch.scheduled_end);
    set_field!(query, "actual_start", patch.actual_start);
    set_field!(query, "actual_end", patch.actual_end);
    set_field!(query, "title", patch.title.map(|v| v.into_inner()));
    set_field!(query, "description", patch.description.map(|v| v.into_inner()));
    set_field!(query, "reason", patch.reason);
    set_field!(query, "chief_complaint", patch.chief_complaint);
    set_field!(query, "location", patch.location);
    set_field!(query, "room_number", patch.room_number);
    set_field!(query, "estimated_cost", non_empty(patch.estimated_cost));
    set_field!(query, "actual_cost", non_empty(patch.actual_cost));
    set_field!(query, "reminder_sent", patch.reminder_sent);
    set_field!(query, "reminder_time", patch.reminder_time);
    set_field!(query, "doctor_notes", patch.doctor_notes);
    set_field!(query, "patient_notes", patch.patient_notes);

    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(&mut *conn).await?;

    get(conn, id).await
}

/// Annule un rendez-vous en conservant la trace du motif.
pub async fn cancel(
    conn: &mut SqliteConnection,
    id: RowId,
    reason: Option<String>,
) -> ServiceResult<Appointment> {
    get(&mut *conn, id).await?;

    sqlx::query(
        "UPDATE appointments SET status = ?, cancellation_reason = ?, updated_at = ? WHERE id = ?",
    )
    .bind(AppointmentStatus::Cancelled)
    .bind(non_empty(reason))
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    info!("Rendez-vous {id} annulé");
    get(conn, id).await
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{AppointmentType, Patient, User};
    use crate::services::test_support;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, hour, 0, 0).unwrap()
    }

    fn new_appointment(patient: &Patient, doctor: &User, day: u32, hour: u32) -> NewAppointment {
        serde_json::from_value(serde_json::json!({
            "patient_id": patient.id,
            "doctor_id": doctor.id,
            "appointment_type": "consultation",
            "scheduled_start": at(day, hour),
            "scheduled_end": at(day, hour + 1),
            "title": "Quarterly check-up",
            "estimated_cost": "80.00",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn schedule_requires_an_active_doctor() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let nurse = test_support::user(&mut tx, "nurse_n", Role::Nurse).await;
        let patient = test_support::patient(&mut tx, "P001").await;

        let appointment = schedule(&mut tx, new_appointment(&patient, &doctor, 2, 9))
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.appointment_type, AppointmentType::Consultation);
        assert_eq!(appointment.estimated_cost.as_deref(), Some("80.00"));
        assert!(!appointment.reminder_sent);

        assert!(matches!(
            schedule(&mut tx, new_appointment(&patient, &nurse, 2, 10)).await,
            Err(ServiceError::Validation(_))
        ));

        let mut ghost = new_appointment(&patient, &doctor, 2, 10);
        ghost.doctor_id = 999;
        assert!(matches!(
            schedule(&mut tx, ghost).await,
            Err(ServiceError::NotFound(DOCTOR_NOT_FOUND))
        ));

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(doctor.id)
            .execute(&mut *tx)
            .await
            .unwrap();
        assert!(matches!(
            schedule(&mut tx, new_appointment(&patient, &doctor, 3, 9)).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn schedule_checks_window_and_references() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let patient = test_support::patient(&mut tx, "P001").await;

        let mut backwards = new_appointment(&patient, &doctor, 2, 9);
        backwards.scheduled_end = backwards.scheduled_start;
        assert!(matches!(
            schedule(&mut tx, backwards).await,
            Err(ServiceError::Validation(_))
        ));

        let mut orphan = new_appointment(&patient, &doctor, 2, 9);
        orphan.patient_id = 999;
        assert!(matches!(
            schedule(&mut tx, orphan).await,
            Err(ServiceError::NotFound(PATIENT_NOT_FOUND))
        ));

        let mut unknown_plan = new_appointment(&patient, &doctor, 2, 9);
        unknown_plan.patient_health_plan_id = Some(42);
        assert!(matches!(
            schedule(&mut tx, unknown_plan).await,
            Err(ServiceError::NotFound(ASSIGNMENT_NOT_FOUND))
        ));
    }

    #[tokio::test]
    async fn list_is_chronological() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let other = test_support::user(&mut tx, "doctor_o", Role::Doctor).await;
        let patient = test_support::patient(&mut tx, "P001").await;

        let late = schedule(&mut tx, new_appointment(&patient, &doctor, 5, 14))
            .await
            .unwrap();
        let early = schedule(&mut tx, new_appointment(&patient, &doctor, 1, 8))
            .await
            .unwrap();
        let others = schedule(&mut tx, new_appointment(&patient, &other, 3, 11))
            .await
            .unwrap();

        let all = list(&mut tx, &AppointmentFilter::default(), Page::default())
            .await
            .unwrap();
        let ids: Vec<RowId> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![early.id, others.id, late.id]);

        let filter = AppointmentFilter {
            doctor_id: Some(doctor.id),
            scheduled_from: Some(at(2, 0)),
            ..Default::default()
        };
        let found = list(&mut tx, &filter, Page::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, late.id);
    }

    #[tokio::test]
    async fn update_validates_the_merged_window() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let patient = test_support::patient(&mut tx, "P001").await;
        let appointment = schedule(&mut tx, new_appointment(&patient, &doctor, 2, 9))
            .await
            .unwrap();

        // Moving only the start past the existing end is rejected.
        let patch = AppointmentPatch {
            scheduled_start: Some(at(2, 11)),
            ..Default::default()
        };
        assert!(matches!(
            update(&mut tx, appointment.id, patch).await,
            Err(ServiceError::Validation(_))
        ));

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            scheduled_end: Some(at(2, 11)),
            doctor_notes: Some("Bring previous lab results".to_owned()),
            ..Default::default()
        };
        let updated = update(&mut tx, appointment.id, patch).await.unwrap();
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.scheduled_end, at(2, 11));
        assert_eq!(updated.scheduled_start, at(2, 9));
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn cancel_records_the_reason() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let patient = test_support::patient(&mut tx, "P001").await;
        let appointment = schedule(&mut tx, new_appointment(&patient, &doctor, 2, 9))
            .await
            .unwrap();

        let cancelled = cancel(&mut tx, appointment.id, Some("Patient travelling".to_owned()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("Patient travelling")
        );

        assert!(matches!(
            cancel(&mut tx, 999, None).await,
            Err(ServiceError::NotFound(APPOINTMENT_NOT_FOUND))
        ));
    }
}

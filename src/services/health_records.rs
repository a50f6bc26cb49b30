//! Dossiers de santé: observations cliniques rattachées à un patient.

use chrono::Utc;
use log::info;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{assignments, patients, Page, ServiceError, ServiceResult};
use crate::authorization::Enforcer;
use crate::models::{
    HealthRecord, HealthRecordFilter, HealthRecordPatch, NewHealthRecord, RecordRef, RowId, User,
};
use crate::utils::error_messages::{
    ASSIGNMENT_NOT_FOUND, INVALID_SEVERITY, PATIENT_NOT_FOUND, RECORD_DELETE_DENIED,
    RECORD_NOT_FOUND,
};

fn check_severity(severity: Option<i64>) -> ServiceResult<()> {
    if severity.is_some_and(|level| !(1..=5).contains(&level)) {
        return Err(ServiceError::Validation(INVALID_SEVERITY.to_owned()));
    }
    Ok(())
}

pub async fn find(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Option<HealthRecord>> {
    Ok(sqlx::query_as("SELECT * FROM health_records WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

pub async fn get(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<HealthRecord> {
    find(conn, id)
        .await?
        .ok_or(ServiceError::NotFound(RECORD_NOT_FOUND))
}

pub async fn create(
    conn: &mut SqliteConnection,
    author: &User,
    new: NewHealthRecord,
) -> ServiceResult<HealthRecord> {
    check_severity(new.severity_level)?;

    if patients::find(&mut *conn, new.patient_id).await?.is_none() {
        return Err(ServiceError::NotFound(PATIENT_NOT_FOUND));
    }
    if let Some(assignment_id) = new.patient_health_plan_id {
        if assignments::find(&mut *conn, assignment_id).await?.is_none() {
            return Err(ServiceError::NotFound(ASSIGNMENT_NOT_FOUND));
        }
    }

    let id = sqlx::query(
        "INSERT INTO health_records (patient_id, recorded_by, patient_health_plan_id, record_type,
                                     title, description, systolic_pressure, diastolic_pressure,
                                     heart_rate, temperature, respiratory_rate, blood_glucose,
                                     weight, height, test_name, test_value, test_unit,
                                     reference_range, severity_level, medication_name, dosage,
                                     frequency, record_date, event_date, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.patient_id)
    .bind(author.id)
    .bind(new.patient_health_plan_id)
    .bind(new.record_type)
    .bind(new.title.as_str())
    .bind(new.description.map(|d| d.into_inner()))
    .bind(new.systolic_pressure)
    .bind(new.diastolic_pressure)
    .bind(new.heart_rate)
    .bind(new.temperature)
    .bind(new.respiratory_rate)
    .bind(new.blood_glucose)
    .bind(new.weight)
    .bind(new.height)
    .bind(new.test_name)
    .bind(new.test_value)
    .bind(new.test_unit)
    .bind(new.reference_range)
    .bind(new.severity_level)
    .bind(new.medication_name)
    .bind(new.dosage)
    .bind(new.frequency)
    .bind(new.record_date)
    .bind(new.event_date)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    info!(
        "Dossier {id} ({}) ajouté au patient {} par {}",
        new.record_type, new.patient_id, author.username
    );
    get(conn, id).await
}

/// Most recent first.
pub async fn list(
    conn: &mut SqliteConnection,
    filter: &HealthRecordFilter,
    page: Page,
) -> ServiceResult<Vec<HealthRecord>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM health_records WHERE 1 = 1");

    if let Some(patient_id) = filter.patient_id {
        query.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(record_type) = filter.record_type {
        query.push(" AND record_type = ").push_bind(record_type);
    }
    if let Some(recorded_by) = filter.recorded_by {
        query.push(" AND recorded_by = ").push_bind(recorded_by);
    }
    if let Some(assignment_id) = filter.patient_health_plan_id {
        query
            .push(" AND patient_health_plan_id = ")
            .push_bind(assignment_id);
    }
    if let Some(from) = filter.record_date_from {
        query.push(" AND record_date >= ").push_bind(from);
    }
    if let Some(to) = filter.record_date_to {
        query.push(" AND record_date <= ").push_bind(to);
    }

    query
        .push(" ORDER BY record_date DESC, id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.skip);

    Ok(query.build_query_as::<HealthRecord>().fetch_all(conn).await?)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: RowId,
    patch: HealthRecordPatch,
) -> ServiceResult<HealthRecord> {
    get(&mut *conn, id).await?;
    check_severity(patch.severity_level)?;

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("UPDATE health_records SET updated_at = ");
    query.push_bind(Utc::now());

    set_field!(query, "title", patch.title.map(|v| v.into_inner()));
    set_field!(query, "description", patch.description.map(|v| v.into_inner()));
    set_field!(query, "systolic_pressure", patch.systolic_pressure);
    set_field!(query, "diastolic_pressure", patch.diastolic_pressure);
    set_field!(query, "heart_rate", patch.heart_rate);
    set_field!(query, "temperature", patch.temperature);
    set_field!(query, "respiratory_rate", patch.respiratory_rate);
    set_field!(query, "blood_glucose", patch.blood_glucose);
    set_field!(query, "weight", patch.weight);
    set_field!(query, "height", patch.height);
    set_field!(query, "test_name", patch.test_name);
    set_field!(query, "test_value", patch.test_value);
    set_field!(query, "test_unit", patch.test_unit);
    set_field!(query, "reference_range", patch.reference_range);
    set_field!(query, "severity_level", patch.severity_level);
    set_field!(query, "medication_name", patch.medication_name);
    set_field!(query, "dosage", patch.dosage);
    set_field!(query, "frequency", patch.frequency);
    set_field!(query, "record_date", patch.record_date);
    set_field!(query, "event_date", patch.event_date);

    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(&mut *conn).await?;

    get(conn, id).await
}

/// Suppression définitive, réservée à l'auteur et aux admins.
pub async fn delete(
    conn: &mut SqliteConnection,
    enforcer: &Enforcer,
    requester: &User,
    id: RowId,
) -> ServiceResult<()> {
    let record = get(&mut *conn, id).await?;
    enforcer
        .with_subject(requester)
        .delete_record(&RecordRef::from(&record))
        .map_err(|_| ServiceError::Forbidden(RECORD_DELETE_DENIED))?;

    sqlx::query("DELETE FROM health_records WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    info!("Dossier {id} supprimé par {}", requester.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::consts::{CASBIN_MODEL, CASBIN_POLICY};
    use crate::models::{Patient, RecordType, Role};
    use crate::services::{assignments, health_plans, patients, test_support};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap()
    }

    fn new_record(patient: &Patient, title: &str, day: u32) -> NewHealthRecord {
        serde_json::from_value(serde_json::json!({
            "patient_id": patient.id,
            "record_type": "vital_signs",
            "title": title,
            "systolic_pressure": 128.0,
            "diastolic_pressure": 82.0,
            "heart_rate": 71.0,
            "record_date": at(day),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_links_author_and_checks_references() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let nurse = test_support::user(&mut tx, "nurse_n", Role::Nurse).await;
        let patient = test_support::patient(&mut tx, "P001").await;

        let record = create(&mut tx, &nurse, new_record(&patient, "Morning vitals", 1))
            .await
            .unwrap();
        assert_eq!(record.recorded_by, nurse.id);
        assert_eq!(record.record_type, RecordType::VitalSigns);
        assert_eq!(record.systolic_pressure, Some(128.0));
        assert_eq!(record.record_date, at(1));

        let mut orphan = new_record(&patient, "Orphan", 1);
        orphan.patient_id = 999;
        assert!(matches!(
            create(&mut tx, &nurse, orphan).await,
            Err(ServiceError::NotFound(PATIENT_NOT_FOUND))
        ));

        let mut unknown_plan = new_record(&patient, "Unknown plan", 1);
        unknown_plan.patient_health_plan_id = Some(999);
        assert!(matches!(
            create(&mut tx, &nurse, unknown_plan).await,
            Err(ServiceError::NotFound(ASSIGNMENT_NOT_FOUND))
        ));

        let mut severe = new_record(&patient, "Severe", 1);
        severe.severity_level = Some(6);
        assert!(matches!(
            create(&mut tx, &nurse, severe).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn list_orders_by_record_date_and_filters() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let nurse = test_support::user(&mut tx, "nurse_n", Role::Nurse).await;
        let p1 = test_support::patient(&mut tx, "P001").await;
        let p2 = test_support::patient(&mut tx, "P002").await;

        create(&mut tx, &nurse, new_record(&p1, "Day 1", 1)).await.unwrap();
        create(&mut tx, &nurse, new_record(&p1, "Day 3", 3)).await.unwrap();
        create(&mut tx, &nurse, new_record(&p2, "Day 2", 2)).await.unwrap();

        let page = Page::default();
        let titles: Vec<String> = list(&mut tx, &HealthRecordFilter::default(), page)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Day 3", "Day 2", "Day 1"]);

        let window = HealthRecordFilter {
            patient_id: Some(p1.id),
            record_date_from: Some(at(2)),
            record_date_to: Some(at(3)),
            ..Default::default()
        };
        let found = list(&mut tx, &window, page).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Day 3");
    }

    #[tokio::test]
    async fn update_keeps_identity_fields() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let nurse = test_support::user(&mut tx, "nurse_n", Role::Nurse).await;
        let patient = test_support::patient(&mut tx, "P001").await;
        let record = create(&mut tx, &nurse, new_record(&patient, "Vitals", 1))
            .await
            .unwrap();

        let patch = HealthRecordPatch {
            heart_rate: Some(90.0),
            severity_level: Some(2),
            ..Default::default()
        };
        let updated = update(&mut tx, record.id, patch).await.unwrap();
        assert_eq!(updated.heart_rate, Some(90.0));
        assert_eq!(updated.severity_level, Some(2));
        assert_eq!(updated.patient_id, patient.id);
        assert_eq!(updated.recorded_by, nurse.id);
        assert_eq!(updated.title, "Vitals");
    }

    #[tokio::test]
    async fn only_recorder_or_admin_may_delete() {
        let db = test_support::database().await;
        let enforcer = Enforcer::load(CASBIN_MODEL, CASBIN_POLICY).await.unwrap();
        let mut tx = db.begin().await.unwrap();
        let nurse = test_support::user(&mut tx, "nurse_n", Role::Nurse).await;
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let admin = test_support::user(&mut tx, "admin_a", Role::Admin).await;
        let patient = test_support::patient(&mut tx, "P001").await;

        let first = create(&mut tx, &nurse, new_record(&patient, "First", 1))
            .await
            .unwrap();
        let second = create(&mut tx, &nurse, new_record(&patient, "Second", 2))
            .await
            .unwrap();

        assert!(matches!(
            delete(&mut tx, &enforcer, &doctor, first.id).await,
            Err(ServiceError::Forbidden(RECORD_DELETE_DENIED))
        ));
        delete(&mut tx, &enforcer, &nurse, first.id).await.unwrap();
        delete(&mut tx, &enforcer, &admin, second.id).await.unwrap();

        assert!(matches!(
            get(&mut tx, first.id).await,
            Err(ServiceError::NotFound(RECORD_NOT_FOUND))
        ));
    }

    #[tokio::test]
    async fn history_survives_patient_deactivation() {
        let db = test_support::database().await;
        let mut tx = db.begin().await.unwrap();
        let doctor = test_support::user(&mut tx, "doctor_d", Role::Doctor).await;
        let patient = test_support::patient(&mut tx, "P001").await;
        let plan = test_support::new_plan("Diet Plan A", false);
        let plan = health_plans::create(&mut tx, &doctor, plan).await.unwrap();
        let assignment = test_support::new_assignment(&patient, &plan);
        let assignment = assignments::assign(&mut tx, &doctor, assignment)
            .await
            .unwrap();
        let record = create(&mut tx, &doctor, new_record(&patient, "Morning vitals", 1))
            .await
            .unwrap();

        patients::soft_delete(&mut tx, patient.id).await.unwrap();

        let kept = get(&mut tx, record.id).await.unwrap();
        assert_eq!(kept.patient_id, patient.id);
        assert_eq!(kept.title, "Morning vitals");

        let filter = HealthRecordFilter {
            patient_id: Some(patient.id),
            ..Default::default()
        };
        assert_eq!(list(&mut tx, &filter, Page::default()).await.unwrap().len(), 1);

        assert_eq!(
            assignments::get(&mut tx, assignment.id).await.unwrap().patient_id,
            patient.id
        );
        let history = assignments::list_for_patient(&mut tx, patient.id, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, assignment.id);
    }
}

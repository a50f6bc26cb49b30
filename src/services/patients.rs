//! Registre des patients. La suppression est logique: `is_active` passe à faux.

use chrono::Utc;
use log::info;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::{
    contains, non_empty, unique_violation, Page, ServiceError, ServiceResult, UniqueKeys,
};
use crate::consts::{DEFAULT_SEARCH_LIMIT, ID_CARD_MAX_LENGTH, MAX_SEARCH_LIMIT, PATIENT_CODE_MAX_LENGTH};
use crate::models::{NewPatient, Patient, PatientFilter, PatientPatch, RowId};
use crate::utils::error_messages::{
    EMPTY_SEARCH_QUERY, ID_CARD_TAKEN, PATIENT_ID_TAKEN, PATIENT_NOT_FOUND, VALIDATION_ERROR,
};

const PATIENT_KEYS: UniqueKeys = &[
    ("patient_id", PATIENT_ID_TAKEN),
    ("id_card", ID_CARD_TAKEN),
];

pub async fn find(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Option<Patient>> {
    Ok(sqlx::query_as("SELECT * FROM patients WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

pub async fn get(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Patient> {
    find(conn, id)
        .await?
        .ok_or(ServiceError::NotFound(PATIENT_NOT_FOUND))
}

async fn id_card_owner(
    conn: &mut SqliteConnection,
    id_card: &str,
) -> ServiceResult<Option<RowId>> {
    let owner: Option<(RowId,)> = sqlx::query_as("SELECT id FROM patients WHERE id_card = ?")
        .bind(id_card)
        .fetch_optional(conn)
        .await?;
    Ok(owner.map(|(id,)| id))
}

fn check_id_card(id_card: &Option<String>) -> ServiceResult<()> {
    match id_card {
        Some(card) if card.chars().count() > ID_CARD_MAX_LENGTH => Err(ServiceError::Validation(
            format!("{VALIDATION_ERROR}: id_card longer than {ID_CARD_MAX_LENGTH} characters"),
        )),
        _ => Ok(()),
    }
}

pub async fn create(conn: &mut SqliteConnection, new: NewPatient) -> ServiceResult<Patient> {
    if new.patient_id.as_str().chars().count() > PATIENT_CODE_MAX_LENGTH {
        return Err(ServiceError::Validation(format!(
            "{VALIDATION_ERROR}: patient_id longer than {PATIENT_CODE_MAX_LENGTH} characters"
        )));
    }
    let id_card = non_empty(new.id_card);
    check_id_card(&id_card)?;

    let taken: Option<(RowId,)> = sqlx::query_as("SELECT id FROM patients WHERE patient_id = ?")
        .bind(new.patient_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    if taken.is_some() {
        return Err(ServiceError::Conflict(PATIENT_ID_TAKEN));
    }

    if let Some(card) = &id_card {
        if id_card_owner(&mut *conn, card).await?.is_some() {
            return Err(ServiceError::Conflict(ID_CARD_TAKEN));
        }
    }

    let id = sqlx::query(
        "INSERT INTO patients (patient_id, name, gender, birth_date, phone, email, id_card,
                               address, emergency_contact, emergency_phone, height, weight,
                               blood_type, allergies, medical_history, current_medications,
                               created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.patient_id.as_str())
    .bind(new.name.as_str())
    .bind(new.gender)
    .bind(new.birth_date)
    .bind(non_empty(new.phone))
    .bind(new.email.map(|e| e.as_str().to_owned()))
    .bind(&id_card)
    .bind(non_empty(new.address))
    .bind(non_empty(new.emergency_contact))
    .bind(non_empty(new.emergency_phone))
    .bind(new.height)
    .bind(new.weight)
    .bind(non_empty(new.blood_type))
    .bind(non_empty(new.allergies))
    .bind(non_empty(new.medical_history))
    .bind(non_empty(new.current_medications))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(unique_violation(PATIENT_KEYS))?
    .last_insert_rowid();

    info!("Patient {} enregistré", new.patient_id);
    get(conn, id).await
}

/// Applies the fields present in `patch`; the business key never changes.
pub async fn update(
    conn: &mut SqliteConnection,
    id: RowId,
    patch: PatientPatch,
) -> ServiceResult<Patient> {
    let current = get(&mut *conn, id).await?;

    let id_card = non_empty(patch.id_card);
    check_id_card(&id_card)?;
    if let Some(card) = &id_card {
        if current.id_card.as_deref() != Some(card.as_str()) {
            if let Some(owner) = id_card_owner(&mut *conn, card).await? {
                if owner != id {
                    return Err(ServiceError::Conflict(ID_CARD_TAKEN));
                }
            }
        }
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE patients SET updated_at = ");
    query.push_bind(Utc::now());

    set_field!(query, "name", patch.name.map(|v| v.into_inner()));
    set_field!(query, "gender", patch.gender);
    set_field!(query, "birth_date", patch.birth_date);
    set_field!(query, "phone", non_empty(patch.phone));
    set_field!(query, "email", patch.email.map(|e| e.as_str().to_owned()));
    set_field!(query, "id_card", id_card);
    set_field!(query, "address", non_empty(patch.address));
    set_field!(query, "emergency_contact", non_empty(patch.emergency_contact));
    set_field!(query, "emergency_phone", non_empty(patch.emergency_phone));
    set_field!(query, "height", patch.height);
    set_field!(query, "weight", patch.weight);
    set_field!(query, "blood_type", non_empty(patch.blood_type));
    set_field!(query, "allergies", non_empty(patch.allergies));
    set_field!(query, "medical_history", non_empty(patch.medical_history));
    set_field!(query, "current_medications", non_empty(patch.current_medications));
    set_field!(query, "is_active", patch.is_active);

    query.push(" WHERE id = ").push_bind(id);
    query
        .build()
        .execute(&mut *conn)
        .await
        .map_err(unique_violation(PATIENT_KEYS))?;

    get(conn, id).await
}

pub async fn soft_delete(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<()> {
    let done = sqlx::query("UPDATE patients SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if done.rows_affected() == 0 {
        return Err(ServiceError::NotFound(PATIENT_NOT_FOUND));
    }
    info!("Patient {id} désactivé");
    Ok(())
}

/// Active patients whose name, business key, phone or national id contains `query`.
pub async fn search(
    conn: &mut SqliteConnection,
    query: &str,
    limit: Option<i64>,
) -> ServiceResult<Vec<Patient>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ServiceError::Validation(EMPTY_SEARCH_QUERY.to_owned()));
    }
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
        return Err(ServiceError::Validation(format!(
            "{VALIDATION_ERROR}: limit must be between 1 and {MAX_SEARCH_LIMIT}"
        )));
    }

    let pattern = contains(query);
    Ok(sqlx::query_as(
        "SELECT * FROM patients
         WHERE is_active = 1
           AND (name REGEXP ?1 OR patient_id REGEXP ?1
                OR COALESCE(phone, '') REGEXP ?1 OR COALESCE(id_card, '') REGEXP ?1)
         ORDER BY id
         LIMIT ?2",
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(conn)
    .await?)
}

pub async fn list(
    conn: &mut SqliteConnection,
    filter: &PatientFilter,
    page: Page,
) -> ServiceResult<Vec<Patient>> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM patients WHERE is_active = ");
    query.push_bind(filter.is_active);

    for (column, value) in [
        ("name", &filter.name),
        ("patient_id", &filter.patient_id),
        ("phone", &filter.phone),
        ("id_card", &filter.id_card),
    ] {
        if let Some(value) = value {
            query
                .push(format!(" AND COALESCE({column}, '') REGEXP "))
                .push_bind(contains(value));
        }
    }

    query
        .push(" ORDER BY id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.skip);

    Ok(query.build_query_as::<Patient>().fetch_all(conn).await?)
}

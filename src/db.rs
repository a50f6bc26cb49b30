//! Stockage relationnel SQLite: pool de connexions, création du schéma et
//! ouverture des transactions.

use std::str::FromStr;

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use thiserror::Error;

use crate::models::AssignmentStatus;

#[derive(Debug, Error)]
pub enum DBError {
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A cloneable handle on the connection pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        full_name TEXT NOT NULL,
        phone TEXT,
        role TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        is_verified BOOLEAN NOT NULL DEFAULT 0,
        specialty TEXT,
        license_number TEXT,
        department TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS patients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        gender TEXT NOT NULL,
        birth_date TEXT NOT NULL,
        phone TEXT,
        email TEXT,
        id_card TEXT UNIQUE,
        address TEXT,
        emergency_contact TEXT,
        emergency_phone TEXT,
        height REAL,
        weight REAL,
        blood_type TEXT,
        allergies TEXT,
        medical_history TEXT,
        current_medications TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS health_plans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        plan_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'draft',
        objectives TEXT,
        instructions TEXT NOT NULL,
        duration_days INTEGER,
        frequency TEXT,
        target_conditions TEXT,
        contraindications TEXT,
        age_range_min INTEGER,
        age_range_max INTEGER,
        created_by INTEGER NOT NULL REFERENCES users(id),
        is_template BOOLEAN NOT NULL DEFAULT 0,
        is_public BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS patient_health_plans (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL REFERENCES patients(id),
        health_plan_id INTEGER NOT NULL REFERENCES health_plans(id) ON DELETE CASCADE,
        assigned_by INTEGER NOT NULL REFERENCES users(id),
        status TEXT NOT NULL DEFAULT 'assigned',
        start_date TEXT NOT NULL,
        end_date TEXT,
        actual_end_date TEXT,
        custom_instructions TEXT,
        custom_objectives TEXT,
        notes TEXT,
        completion_percentage INTEGER NOT NULL DEFAULT 0
            CHECK (completion_percentage BETWEEN 0 AND 100),
        last_check_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS health_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL REFERENCES patients(id),
        recorded_by INTEGER NOT NULL REFERENCES users(id),
        patient_health_plan_id INTEGER REFERENCES patient_health_plans(id) ON DELETE SET NULL,
        record_type TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        systolic_pressure REAL,
        diastolic_pressure REAL,
        heart_rate REAL,
        temperature REAL,
        respiratory_rate REAL,
        blood_glucose REAL,
        weight REAL,
        height REAL,
        test_name TEXT,
        test_value TEXT,
        test_unit TEXT,
        reference_range TEXT,
        severity_level INTEGER CHECK (severity_level BETWEEN 1 AND 5),
        medication_name TEXT,
        dosage TEXT,
        frequency TEXT,
        record_date TEXT NOT NULL,
        event_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL REFERENCES patients(id),
        doctor_id INTEGER NOT NULL REFERENCES users(id),
        patient_health_plan_id INTEGER REFERENCES patient_health_plans(id) ON DELETE SET NULL,
        appointment_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'scheduled',
        scheduled_start TEXT NOT NULL,
        scheduled_end TEXT NOT NULL,
        actual_start TEXT,
        actual_end TEXT,
        title TEXT NOT NULL,
        description TEXT,
        reason TEXT,
        chief_complaint TEXT,
        location TEXT,
        room_number TEXT,
        estimated_cost TEXT,
        actual_cost TEXT,
        reminder_sent BOOLEAN NOT NULL DEFAULT 0,
        reminder_time TEXT,
        doctor_notes TEXT,
        patient_notes TEXT,
        cancellation_reason TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
];

impl Database {
    /// Opens (creating if needed) the database at `url` and bootstraps the schema.
    pub async fn open(url: &str) -> Result<Self, DBError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|_| DBError::InvalidUrl(url.to_owned()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .with_regexp();

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        info!("Database ready at {url}");
        Ok(db)
    }

    /// A private in-memory database. One connection that never expires, so
    /// the data lives as long as the pool.
    pub async fn open_in_memory() -> Result<Self, DBError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|_| DBError::InvalidUrl("sqlite::memory:".to_owned()))?
            .foreign_keys(true)
            .with_regexp();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), DBError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        // At most one active assignment of a plan per patient
        let index = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS one_active_assignment
                 ON patient_health_plans (patient_id, health_plan_id) WHERE {}",
            AssignmentStatus::active_condition()
        );
        sqlx::query(&index).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Starts the transaction a request runs in. Dropping it uncommitted rolls back.
    ///
    /// The write lock is taken up front, so concurrent requests queue on the
    /// busy timeout and each one sees the previous commit before its checks.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

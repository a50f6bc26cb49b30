//! Identité et accès: inscription, authentification et résolution des jetons.

use chrono::Utc;
use log::{info, warn};
use sqlx::SqliteConnection;

use super::{non_empty, unique_violation, ServiceError, ServiceResult, UniqueKeys};
use crate::models::{NewUser, RowId, User};
use crate::utils::error_messages::{
    EMAIL_TAKEN, INVALID_TOKEN, PASSWORD_MATCHES_USERNAME, USERNAME_TAKEN,
};
use crate::utils::password_utils::{hash, verify};
use crate::utils::token::TokenCodec;

const USER_KEYS: UniqueKeys = &[("username", USERNAME_TAKEN), ("email", EMAIL_TAKEN)];

pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> ServiceResult<Option<User>> {
    Ok(sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(conn)
        .await?)
}

pub async fn get_user(conn: &mut SqliteConnection, id: RowId) -> ServiceResult<Option<User>> {
    Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

/// Enregistre un nouvel utilisateur. Le mot de passe n'est stocké que haché.
pub async fn register(conn: &mut SqliteConnection, new: NewUser) -> ServiceResult<User> {
    if new
        .password
        .as_str()
        .eq_ignore_ascii_case(new.username.as_str())
    {
        return Err(ServiceError::Validation(PASSWORD_MATCHES_USERNAME.to_owned()));
    }

    if find_by_username(&mut *conn, new.username.as_str())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(USERNAME_TAKEN));
    }

    let email_taken: Option<(RowId,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(new.email.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    if email_taken.is_some() {
        return Err(ServiceError::Conflict(EMAIL_TAKEN));
    }

    let hashed = hash(new.password.as_str())?;

    let id = sqlx::query(
        "INSERT INTO users (username, email, hashed_password, full_name, phone, role,
                            specialty, license_number, department, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.username.as_str())
    .bind(new.email.as_str())
    .bind(hashed.as_str())
    .bind(new.full_name.as_str())
    .bind(non_empty(new.phone))
    .bind(new.role)
    .bind(non_empty(new.specialty))
    .bind(non_empty(new.license_number))
    .bind(non_empty(new.department))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(unique_violation(USER_KEYS))?
    .last_insert_rowid();

    info!(
        "Compte créé avec succès pour l'utilisateur {} ({})",
        new.username, new.role
    );

    get_user(conn, id)
        .await?
        .ok_or(ServiceError::Database(sqlx::Error::RowNotFound))
}

/// Vérifie les identifiants et délivre un jeton d'accès.
pub async fn authenticate(
    conn: &mut SqliteConnection,
    tokens: &TokenCodec,
    username: &str,
    password: &str,
) -> ServiceResult<String> {
    let user = find_by_username(conn, username).await?;

    if !verify(password, user.as_ref().map(|u| &u.hashed_password)) {
        warn!("Échec de connexion pour {username}");
        return Err(ServiceError::InvalidCredentials);
    }
    let Some(user) = user else {
        return Err(ServiceError::InvalidCredentials);
    };

    if !user.is_active {
        warn!("Connexion refusée, compte inactif: {username}");
        return Err(ServiceError::InactiveUser);
    }

    info!("Connexion de {username}");
    issue_token(tokens, &user)
}

pub fn issue_token(tokens: &TokenCodec, user: &User) -> ServiceResult<String> {
    Ok(tokens.issue(&user.username)?)
}

/// Retrouve l'utilisateur porteur d'un jeton.
pub async fn resolve(
    conn: &mut SqliteConnection,
    tokens: &TokenCodec,
    token: &str,
) -> ServiceResult<User> {
    let claims = tokens.verify(token).map_err(|e| {
        info!("Jeton rejeté: {e}");
        ServiceError::Unauthenticated(INVALID_TOKEN)
    })?;

    let user = find_by_username(conn, &claims.sub)
        .await?
        .ok_or(ServiceError::Unauthenticated(INVALID_TOKEN))?;

    if !user.is_active {
        return Err(ServiceError::InactiveUser);
    }
    Ok(user)
}

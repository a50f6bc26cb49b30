//! Structures propres à l'API HTTP: formulaires et réponses.

use serde::{Deserialize, Serialize};

use crate::models::AppointmentStatus;

/// Formulaire de connexion (`application/x-www-form-urlencoded`)
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Banner {
    pub message: String,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// Réponse à l'annulation d'un rendez-vous
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub message: String,
    pub status: AppointmentStatus,
}

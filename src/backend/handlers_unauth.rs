//! Gestion des routes accessibles sans authentification:
//! bannière, état de santé, connexion et inscription.

use axum::extract::State;
use axum::Json;
use log::info;

use crate::backend::extractors::{ApiForm, ApiJson};
use crate::backend::models::{Banner, Health, LoginForm, TokenResponse};
use crate::backend::state::AppState;
use crate::consts::APP_VERSION;
use crate::models::{NewUser, User};
use crate::services::{auth, ServiceResult};

pub async fn index(State(state): State<AppState>) -> Json<Banner> {
    Json(Banner {
        message: state.config.app_name.clone(),
        version: APP_VERSION,
        status: "running",
    })
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "healthy" })
}

/// Échange nom d'utilisateur et mot de passe contre un jeton d'accès
pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> ServiceResult<Json<TokenResponse>> {
    let mut tx = state.db.begin().await?;
    let token = auth::authenticate(&mut tx, &state.tokens, &form.username, &form.password).await?;
    tx.commit().await?;
    Ok(Json(TokenResponse::bearer(token)))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewUser>,
) -> ServiceResult<ApiJson<User>> {
    let mut tx = state.db.begin().await?;
    let user = auth::register(&mut tx, new).await?;
    tx.commit().await?;
    info!("Inscription terminée: {}", user.username);
    Ok(ApiJson(user))
}

//! Extracteur d'authentification.
//! Vérifie le jeton `Bearer` et rejette les requêtes non authentifiées.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::backend::state::AppState;
use crate::models::User;
use crate::services::{auth, ServiceError};
use crate::utils::error_messages::NOT_AUTHENTICATED;

/// L'utilisateur actif porteur du jeton de la requête
pub struct CurrentUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or(ServiceError::Unauthenticated(NOT_AUTHENTICATED))?;

        // Released before the handler opens its transaction.
        let mut conn = state.db.pool().acquire().await?;
        let user = auth::resolve(&mut conn, &state.tokens, token).await?;
        Ok(CurrentUser(user))
    }
}

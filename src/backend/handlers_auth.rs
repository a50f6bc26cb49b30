//! Routes liées au compte de l'utilisateur connecté.

use axum::Json;

use crate::backend::middlewares::CurrentUser;
use crate::models::User;

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

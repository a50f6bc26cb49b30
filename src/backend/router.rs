//! Configuration des routes pour l'application.
//! Définit les routes accessibles avec ou sans authentification et configure le CORS.

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use log::warn;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::backend::handlers_appointments::{
    cancel_appointment, get_appointment, list_appointments, schedule_appointment,
    update_appointment,
};
use crate::backend::handlers_assignments::{
    assign_plan, cancel_assignment, get_assignment, list_assignments, list_patient_assignments,
    update_assignment,
};
use crate::backend::handlers_auth::me;
use crate::backend::handlers_health_plans::{
    create_plan, delete_plan, get_plan, list_plans, list_templates, update_plan,
};
use crate::backend::handlers_health_records::{
    create_record, delete_record, get_record, list_records, update_record,
};
use crate::backend::handlers_patients::{
    create_patient, delete_patient, get_patient, list_patients, search_patients, update_patient,
};
use crate::backend::handlers_unauth::{health, index, login, register};
use crate::backend::state::AppState;
use crate::config::Config;

/// Initialisation du routeur principal
pub fn get_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(unauth_routes())
        .merge(auth_routes())
        .layer(cors)
        .with_state(state)
}

/// Origines autorisées lues depuis la configuration
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Routes accessibles sans authentification
fn unauth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
}

/// Routes nécessitant un jeton (extracteur `CurrentUser` dans chaque handler)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        // Patients
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patients/", get(list_patients).post(create_patient))
        .route("/api/patients/search", get(search_patients))
        .route("/api/patients/search/", get(search_patients))
        .route(
            "/api/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        // Plans de santé
        .route("/api/health-plans", get(list_plans).post(create_plan))
        .route("/api/health-plans/", get(list_plans).post(create_plan))
        .route("/api/health-plans/templates", get(list_templates))
        .route("/api/health-plans/templates/", get(list_templates))
        .route(
            "/api/health-plans/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        // Attributions
        .route(
            "/api/patient-health-plans",
            get(list_assignments).post(assign_plan),
        )
        .route(
            "/api/patient-health-plans/",
            get(list_assignments).post(assign_plan),
        )
        .route(
            "/api/patient-health-plans/:id",
            get(get_assignment)
                .put(update_assignment)
                .delete(cancel_assignment),
        )
        .route(
            "/api/patient-health-plans/patient/:patient_id",
            get(list_patient_assignments),
        )
        // Dossiers
        .route("/api/health-records", get(list_records).post(create_record))
        .route("/api/health-records/", get(list_records).post(create_record))
        .route(
            "/api/health-records/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        // Rendez-vous
        .route(
            "/api/appointments",
            get(list_appointments).post(schedule_appointment),
        )
        .route(
            "/api/appointments/",
            get(list_appointments).post(schedule_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(get_appointment)
                .put(update_appointment)
                .delete(cancel_appointment),
        )
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::authorization::Enforcer;
    use crate::consts::{CASBIN_MODEL, CASBIN_POLICY};
    use crate::db::Database;
    use crate::utils::error_messages::{
        ASSIGNMENT_EXISTS, INACTIVE_USER, LOGIN_ERROR, PLAN_ACCESS_DENIED,
    };

    struct TestApp {
        router: Router,
        db: Database,
    }

    async fn app() -> TestApp {
        let config = Config::from_lookup(|key| match key {
            "SECRET_KEY" => Some("router-test-secret".to_owned()),
            _ => None,
        })
        .unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let enforcer = Enforcer::load(CASBIN_MODEL, CASBIN_POLICY).await.unwrap();
        let state = AppState::new(config, db.clone(), enforcer);
        TestApp {
            router: get_router(state),
            db,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => request
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn register(&self, username: &str, role: &str) -> Value {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "email": format!("{username}@clinic.test"),
                        "password": "S3cure-password",
                        "full_name": format!("Dr {username}"),
                        "role": role,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body
        }

        async fn login_raw(&self, username: &str, password: &str) -> axum::response::Response {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("username={username}&password={password}")))
                .unwrap();
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn login(&self, username: &str) -> String {
            let response = self.login_raw(username, "S3cure-password").await;
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["token_type"], "bearer");
            body["access_token"].as_str().unwrap().to_owned()
        }

        async fn staff(&self, username: &str, role: &str) -> (i64, String) {
            let user = self.register(username, role).await;
            (user["id"].as_i64().unwrap(), self.login(username).await)
        }
    }

    fn plan_body(title: &str) -> Value {
        json!({
            "title": title,
            "plan_type": "diet",
            "instructions": "Low sodium, five portions of vegetables a day",
            "duration_days": 30,
        })
    }

    fn patient_body(patient_id: &str) -> Value {
        json!({
            "patient_id": patient_id,
            "name": "Alice Martin",
            "gender": "female",
            "birth_date": "1980-05-17",
            "phone": "555-0100",
        })
    }

    #[tokio::test]
    async fn banner_and_health_are_public() {
        let app = app().await;
        let (status, body) = app.send(Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], crate::consts::APP_VERSION);

        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn authentication_flow() {
        let app = app().await;
        let user = app.register("nurse_n", "nurse").await;
        assert!(user.get("hashed_password").is_none());
        assert!(user.get("password").is_none());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": "nurse_n",
                    "email": "other@clinic.test",
                    "password": "S3cure-password",
                    "full_name": "Someone Else",
                    "role": "nurse",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let response = app.login_raw("nurse_n", "wrong-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], LOGIN_ERROR);

        let token = app.login("nurse_n").await;
        let (status, body) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "nurse_n");
        assert_eq!(body["role"], "nurse");

        let (status, _) = app.send(Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let tampered = format!("{token}x");
        let (status, _) = app
            .send(Method::GET, "/api/auth/me", Some(&tampered), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn inactive_accounts_are_refused() {
        let app = app().await;
        let (_, token) = app.staff("nurse_n", "nurse").await;

        sqlx::query("UPDATE users SET is_active = 0 WHERE username = 'nurse_n'")
            .execute(app.db.pool())
            .await
            .unwrap();

        let response = app.login_raw("nurse_n", "S3cure-password").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], INACTIVE_USER);

        let (status, _) = app.send(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn private_plan_becomes_visible_once_published() {
        let app = app().await;
        let (_, admin) = app.staff("admin_a", "admin").await;
        let (_, doctor_d) = app.staff("doctor_d", "doctor").await;
        let (_, doctor_e) = app.staff("doctor_e", "doctor").await;

        let (status, plan) = app
            .send(
                Method::POST,
                "/api/health-plans/",
                Some(&doctor_d),
                Some(plan_body("Diet Plan A")),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(plan["status"], "draft");
        assert_eq!(plan["is_public"], false);
        let uri = format!("/api/health-plans/{}", plan["id"]);

        let (status, body) = app.send(Method::GET, &uri, Some(&doctor_e), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], PLAN_ACCESS_DENIED);

        let (status, _) = app
            .send(
                Method::PUT,
                &uri,
                Some(&doctor_e),
                Some(json!({ "is_public": true })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .send(Method::PUT, &uri, Some(&admin), Some(json!({ "is_public": true })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_public"], true);

        let (status, body) = app.send(Method::GET, &uri, Some(&doctor_e), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Diet Plan A");

        let (status, _) = app.send(Method::DELETE, &uri, Some(&doctor_e), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app.send(Method::DELETE, &uri, Some(&doctor_d), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn duplicate_assignment_is_rejected_until_cancelled() {
        let app = app().await;
        let (_, doctor) = app.staff("doctor_d", "doctor").await;
        let (_, nurse) = app.staff("nurse_n", "nurse").await;

        let (_, patient) = app
            .send(Method::POST, "/api/patients/", Some(&doctor), Some(patient_body("P001")))
            .await;
        let (_, plan) = app
            .send(
                Method::POST,
                "/api/health-plans",
                Some(&doctor),
                Some(plan_body("Diet Plan A")),
            )
            .await;
        let assignment = json!({
            "patient_id": patient["id"],
            "health_plan_id": plan["id"],
            "start_date": "2024-03-01",
        });

        let (status, _) = app
            .send(
                Method::POST,
                "/api/patient-health-plans/",
                Some(&nurse),
                Some(assignment.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, first) = app
            .send(
                Method::POST,
                "/api/patient-health-plans/",
                Some(&doctor),
                Some(assignment.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "assigned");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/patient-health-plans/",
                Some(&doctor),
                Some(assignment.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], ASSIGNMENT_EXISTS);

        // Active assignment blocks plan deletion.
        let plan_uri = format!("/api/health-plans/{}", plan["id"]);
        let (status, _) = app.send(Method::DELETE, &plan_uri, Some(&doctor), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                Method::DELETE,
                &format!("/api/patient-health-plans/{}", first["id"]),
                Some(&doctor),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/patient-health-plans/",
                Some(&doctor),
                Some(assignment),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(
                Method::GET,
                &format!(
                    "/api/patient-health-plans/patient/{}?status=cancelled",
                    patient["id"]
                ),
                Some(&nurse),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn soft_deleted_patient_leaves_listings() {
        let app = app().await;
        let (_, nurse) = app.staff("nurse_n", "nurse").await;

        let (status, patient) = app
            .send(Method::POST, "/api/patients", Some(&nurse), Some(patient_body("P001")))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .send(Method::POST, "/api/patients", Some(&nurse), Some(patient_body("P001")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, found) = app
            .send(Method::GET, "/api/patients/search/?query=alice", Some(&nurse), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 1);

        let uri = format!("/api/patients/{}", patient["id"]);
        let (status, _) = app.send(Method::DELETE, &uri, Some(&nurse), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app.send(Method::GET, "/api/patients/", Some(&nurse), None).await;
        assert!(listed.as_array().unwrap().is_empty());
        let (_, found) = app
            .send(Method::GET, "/api/patients/search?query=alice", Some(&nurse), None)
            .await;
        assert!(found.as_array().unwrap().is_empty());

        let (status, body) = app.send(Method::GET, &uri, Some(&nurse), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_active"], false);

        let (_, listed) = app
            .send(Method::GET, "/api/patients?is_active=false", Some(&nurse), None)
            .await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn boundary_validation_answers_422() {
        let app = app().await;
        let (doctor_id, doctor) = app.staff("doctor_d", "doctor").await;
        let (nurse_id, nurse) = app.staff("nurse_n", "nurse").await;
        let (_, patient) = app
            .send(Method::POST, "/api/patients", Some(&nurse), Some(patient_body("P001")))
            .await;

        let (status, body) = app
            .send(Method::GET, "/api/patients?limit=0", Some(&nurse), None)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/patients",
                Some(&nurse),
                Some(json!({ "patient_id": "P002" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, _) = app
            .send(Method::GET, "/api/patients/not-a-number", Some(&nurse), None)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let appointment = |practitioner: i64, end: &str| {
            json!({
                "patient_id": patient["id"],
                "doctor_id": practitioner,
                "appointment_type": "consultation",
                "scheduled_start": "2024-04-02T09:00:00Z",
                "scheduled_end": end,
                "title": "Check-up",
            })
        };

        let (status, _) = app
            .send(
                Method::POST,
                "/api/appointments",
                Some(&doctor),
                Some(appointment(doctor_id, "2024-04-02T09:00:00Z")),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/appointments",
                Some(&doctor),
                Some(appointment(nurse_id, "2024-04-02T10:00:00Z")),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, created) = app
            .send(
                Method::POST,
                "/api/appointments/",
                Some(&nurse),
                Some(appointment(doctor_id, "2024-04-02T10:00:00Z")),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!("/api/appointments/{}", created["id"]),
                Some(&nurse),
                Some(json!({ "cancellation_reason": "Rescheduled" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "cancelled");
    }

    #[tokio::test]
    async fn records_are_deleted_by_their_author_only() {
        let app = app().await;
        let (_, nurse) = app.staff("nurse_n", "nurse").await;
        let (_, doctor) = app.staff("doctor_d", "doctor").await;
        let (_, patient) = app
            .send(Method::POST, "/api/patients", Some(&nurse), Some(patient_body("P001")))
            .await;

        let (status, record) = app
            .send(
                Method::POST,
                "/api/health-records",
                Some(&nurse),
                Some(json!({
                    "patient_id": patient["id"],
                    "record_type": "vital_signs",
                    "title": "Morning vitals",
                    "heart_rate": 72.0,
                    "record_date": "2024-03-01T08:00:00Z",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let uri = format!("/api/health-records/{}", record["id"]);

        let (status, _) = app.send(Method::DELETE, &uri, Some(&doctor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(Method::DELETE, &uri, Some(&nurse), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.send(Method::GET, &uri, Some(&nurse), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

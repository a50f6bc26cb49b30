//! Module principal pour le backend de l'application.
//! Contient le routeur, l'état partagé, les extracteurs, les gestionnaires
//! par ressource et la traduction des erreurs en réponses HTTP.

mod errors;
mod extractors;
mod handlers_appointments;
mod handlers_assignments;
mod handlers_auth;
mod handlers_health_plans;
mod handlers_health_records;
mod handlers_patients;
mod handlers_unauth;
mod middlewares;
mod models;
pub mod router;
pub mod state;

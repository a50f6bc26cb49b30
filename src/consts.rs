//! Global constants and configuration defaults.

use crate::models::Role;

pub const APP_NAME: &str = "Health Management System";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HTTP_HOST: &str = "0.0.0.0";
pub const HTTP_PORT: u16 = 8000;
pub const DATABASE_URL: &str = "sqlite://health_management.db?mode=rwc";
pub const CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8080";

/// Signing key used by debug builds when SECRET_KEY is not set.
pub const DEBUG_SECRET_KEY: &str = "debug-secret-key-change-in-production";
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

pub const CASBIN_MODEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/access_control/model.conf");
pub const CASBIN_POLICY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/access_control/policy.csv");

pub const DEFAULT_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_LIMIT: i64 = 1_000;
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;
pub const MAX_SEARCH_LIMIT: i64 = 100;

pub const PATIENT_CODE_MAX_LENGTH: usize = 20;
pub const ID_CARD_MAX_LENGTH: usize = 18;

/// Roles allowed to put a patient on a health plan.
pub const PLAN_ASSIGNERS: &[Role] = &[Role::Admin, Role::Doctor];

//! Backend for a small clinic: staff accounts, the patient registry, the
//! health-plan catalog, plan assignments, health records and appointments.

pub mod authorization;
pub mod backend;
pub mod config;
pub mod consts;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

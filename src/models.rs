//! Modèle de données
//!
//! Stored rows, the closed enumerations they use, and the inputs accepted to
//! create, patch and filter them. Inputs deserialize straight from request
//! bodies; validated wrappers reject malformed fields at that point.

mod appointment;
mod assignment;
mod health_plan;
mod health_record;
mod patient;
mod user;

pub use appointment::*;
pub use assignment::*;
pub use health_plan::*;
pub use health_record::*;
pub use patient::*;
pub use user::*;

/// Primary key of a stored row.
pub type RowId = i64;

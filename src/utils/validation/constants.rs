//! Constants used throughout the validation system

/// Maximum length for long-form content
pub const MAX_CONTENT_LENGTH: usize = 2_000;
/// Maximum length for short-form content
pub const MAX_SHORT_CONTENT_LENGTH: usize = 250;
/// Maximum length of an email address
pub const MAX_EMAIL_LENGTH: usize = 254;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

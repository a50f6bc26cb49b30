//! Messages returned in the `detail` field of error responses

pub const VALIDATION_ERROR: &str = "Validation failed";
pub const CONFLICT: &str = "Resource already exists";
pub const INTERNAL_ERROR: &str = "Internal server error";

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const INVALID_TOKEN: &str = "Could not validate credentials";
pub const LOGIN_ERROR: &str = "Incorrect username or password";
pub const INACTIVE_USER: &str = "Inactive user";
pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

pub const USERNAME_TAKEN: &str = "Username already registered";
pub const EMAIL_TAKEN: &str = "Email already registered";
pub const PASSWORD_MATCHES_USERNAME: &str = "Password must differ from the username";

pub const PATIENT_NOT_FOUND: &str = "Patient not found";
pub const PATIENT_ID_TAKEN: &str = "Patient ID already exists";
pub const ID_CARD_TAKEN: &str = "ID card already registered";
pub const EMPTY_SEARCH_QUERY: &str = "Search query cannot be empty";

pub const PLAN_NOT_FOUND: &str = "Health plan not found";
pub const PLAN_ACCESS_DENIED: &str = "Not enough permissions to access this health plan";
pub const PLAN_UPDATE_DENIED: &str = "Not enough permissions to update this health plan";
pub const PLAN_DELETE_DENIED: &str = "Not enough permissions to delete this health plan";
pub const PLAN_IN_USE: &str = "Cannot delete health plan with active assignments";
pub const INVALID_AGE_RANGE: &str = "age_range_min cannot exceed age_range_max";
pub const INVALID_DURATION: &str = "duration_days must be positive";

pub const ASSIGNMENT_NOT_FOUND: &str = "Patient health plan not found";
pub const ASSIGNMENT_EXISTS: &str = "Patient already has this health plan assigned";
pub const INVALID_PERCENTAGE: &str = "completion_percentage must be between 0 and 100";
pub const INVALID_DATE_RANGE: &str = "end_date cannot be before start_date";

pub const RECORD_NOT_FOUND: &str = "Health record not found";
pub const RECORD_DELETE_DENIED: &str = "Not enough permissions to delete this health record";
pub const INVALID_SEVERITY: &str = "severity_level must be between 1 and 5";

pub const APPOINTMENT_NOT_FOUND: &str = "Appointment not found";
pub const DOCTOR_NOT_FOUND: &str = "Doctor not found";
pub const NOT_A_DOCTOR: &str = "doctor_id must reference an active doctor";
pub const INVALID_TIME_WINDOW: &str = "scheduled_end must be after scheduled_start";

pub const INVALID_PAGE: &str = "skip must be >= 0 and limit between 1 and 1000";

//! Backend endpoints and client defaults

use crate::error::{ApiError, Result};

/// Hosted backend used when no override is configured
pub const DEFAULT_BASE_URL: &str = "https://gradebook-backend-xhw2.onrender.com";

/// Environment variable overriding the backend base URL
pub const BASE_URL_ENV: &str = "GRADEBOOK_API_URL";

/// Per-request timeout applied by the transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const LOGIN_ENDPOINT: &str = "/api/v1/auth/login";
pub const LOGOUT_ENDPOINT: &str = "/api/v1/auth/logout";
pub const REFRESH_ENDPOINT: &str = "/api/v1/auth/refresh";

pub const ME_ENDPOINT: &str = "/api/v1/users/me";
pub const DASHBOARD_ENDPOINT: &str = "/api/v1/dashboard";
pub const SUBJECTS_ENDPOINT: &str = "/api/v1/subjects";
pub const SCHEDULE_WEEK_ENDPOINT: &str = "/api/v1/schedule/week";
pub const SCHEDULE_DAY_ENDPOINT: &str = "/api/v1/schedule/day";
pub const NOTIFICATIONS_ENDPOINT: &str = "/api/v1/notifications";
pub const NOTIFICATIONS_READ_ALL_ENDPOINT: &str = "/api/v1/notifications/read-all";
pub const SETTINGS_ENDPOINT: &str = "/api/v1/settings";

/// Percent-encode `id` as a single path segment.
///
/// Empty and dot-only ids are rejected since URL normalization would turn
/// them into a different route.
pub fn path_segment(id: &str) -> Result<String> {
    if id.is_empty() || id.chars().all(|c| c == '.') {
        return Err(ApiError::InvalidRequest(format!("invalid path segment {id:?}")));
    }
    Ok(urlencoding::encode(id).into_owned())
}

/// `/api/v1/subjects/{id}/grades`
pub fn subject_grades_endpoint(subject_id: &str) -> Result<String> {
    Ok(format!("{SUBJECTS_ENDPOINT}/{}/grades", path_segment(subject_id)?))
}

/// `/api/v1/notifications/{id}/read`
pub fn notification_read_endpoint(notification_id: &str) -> Result<String> {
    Ok(format!(
        "{NOTIFICATIONS_ENDPOINT}/{}/read",
        path_segment(notification_id)?
    ))
}

//! Client-side counters
//!
//! - `gradebook_requests_total` (counter): labels `auth`, `outcome`
//! - `gradebook_token_refresh_total` (counter): label `outcome`
//! - `gradebook_network_errors_total` (counter): label `kind`
//!
//! Without an installed recorder these calls are no-ops.

use crate::error::ApiError;

/// Record a finished backend call.
pub fn record_request(authenticated: bool, result: Result<(), &ApiError>) {
    let auth = if authenticated { "bearer" } else { "public" };
    let outcome = match result {
        Ok(()) => "success",
        Err(ApiError::Network { .. }) => "network_error",
        Err(ApiError::SessionExpired { .. }) => "session_expired",
        Err(ApiError::Request { .. }) => "rejected",
        Err(ApiError::Decode { .. }) => "decode_error",
        Err(ApiError::InvalidRequest(_)) => "invalid_request",
        Err(ApiError::Storage(_)) => "storage_error",
    };
    metrics::counter!("gradebook_requests_total", "auth" => auth, "outcome" => outcome)
        .increment(1);
}

/// Outcome of one refresh exchange (not of each caller attached to it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Renewed,
    NoRefreshToken,
    Failed,
}

impl RefreshOutcome {
    fn label(self) -> &'static str {
        match self {
            RefreshOutcome::Renewed => "renewed",
            RefreshOutcome::NoRefreshToken => "no_refresh_token",
            RefreshOutcome::Failed => "failed",
        }
    }
}

pub fn record_refresh(outcome: RefreshOutcome) {
    metrics::counter!("gradebook_token_refresh_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_network_error(kind: &'static str) {
    metrics::counter!("gradebook_network_errors_total", "kind" => kind).increment(1);
}

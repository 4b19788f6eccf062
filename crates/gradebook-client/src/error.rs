//! Error taxonomy for backend calls
//!
//! Callers branch on three shapes: the request never reached the server
//! (`Network`), the server answered with a non-2xx (`Request`), or the
//! session could not be renewed (`SessionExpired`). `user_message` is the
//! one place that turns any of them into text for a person.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Maximum length for raw response bodies carried in errors
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Backend error message: a single string or a list of validation messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Single(message) => f.write_str(message),
            ErrorMessage::Many(messages) => f.write_str(&messages.join(", ")),
        }
    }
}

/// Standard backend error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub status_code: u16,
    pub message: ErrorMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiErrorBody {
    /// Body built on the client when the server's response carries none.
    pub fn synthesized(status: u16, message: impl Into<String>, path: &str, request_id: &str) -> Self {
        Self {
            status_code: status,
            message: ErrorMessage::Single(message.into()),
            error: None,
            path: Some(path.to_string()),
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            request_id: Some(request_id.to_string()),
        }
    }

    /// Parse the backend's error JSON, falling back to the status reason
    /// phrase when the body is empty or not in the standard shape.
    pub fn from_response_body(status: StatusCode, body: &str, path: &str, request_id: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) => parsed,
            Err(_) => {
                let reason = status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.as_str().to_string());
                let mut synthesized =
                    Self::synthesized(status.as_u16(), reason, path, request_id);
                let trimmed = body.trim();
                if !trimmed.is_empty() {
                    synthesized.error = Some(truncate_body(trimmed));
                }
                synthesized
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

/// How a transport failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Connect,
    Other,
}

impl NetworkErrorKind {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Connect => "connect",
            NetworkErrorKind::Other => "other",
        }
    }
}

/// Error from a backend call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never got a response: timeout, DNS or connection failure.
    #[error("{message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// The server responded with a non-2xx status.
    #[error("{}", .body.message)]
    Request { status: u16, body: ApiErrorBody },

    /// A 401 could not be recovered because the token refresh failed.
    #[error("Session expired")]
    SessionExpired { path: String },

    /// A 2xx response whose body was not the expected JSON.
    #[error("invalid response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The request could not be built (bad URL, header or body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Tokens could not be written to local storage.
    #[error("token storage failed: {0}")]
    Storage(#[from] gradebook_auth::Error),
}

impl ApiError {
    /// 401 raised before any request is sent because no token is stored.
    pub fn no_access_token(path: &str) -> Self {
        ApiError::Request {
            status: 401,
            body: ApiErrorBody::synthesized(401, "No access token available", path, ""),
        }
    }

    /// HTTP status when the error maps to one (session expiry counts as 401).
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            ApiError::SessionExpired { .. } => Some(401),
            ApiError::Network { .. }
            | ApiError::Decode { .. }
            | ApiError::InvalidRequest(_)
            | ApiError::Storage(_) => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Structured backend payload, when the server sent one.
    pub fn details(&self) -> Option<&ApiErrorBody> {
        match self {
            ApiError::Request { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Network { .. } => "Connection problem, check your network".to_string(),
            ApiError::Request { status: 401, .. } | ApiError::SessionExpired { .. } => {
                "Invalid login or password".to_string()
            }
            ApiError::Request { status, .. } if *status >= 500 => {
                "Server error, please try again later".to_string()
            }
            ApiError::Request { body, .. } => {
                let message = body.message.to_string();
                if message.is_empty() {
                    "Request failed".to_string()
                } else {
                    message
                }
            }
            ApiError::Decode { .. } => "Unexpected server response".to_string(),
            ApiError::InvalidRequest(_) => "Request failed".to_string(),
            ApiError::Storage(_) => "Could not save the session on this device".to_string(),
        }
    }
}

/// Result alias for backend calls.
pub type Result<T> = std::result::Result<T, ApiError>;

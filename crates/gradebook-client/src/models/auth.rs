use std::fmt;

use common::Secret;
use serde::{Deserialize, Serialize, Serializer};

use super::user::User;
use crate::error::{ApiError, Result};

/// Minimum password length accepted by the login form.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Login input. Transient: never persisted, password never logged.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub login: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: Secret<String>,
}

fn expose_secret<S: Serializer>(secret: &Secret<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose())
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<Secret<String>>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Reject input the backend would refuse anyway, without a round trip.
    pub fn validate(&self) -> Result<()> {
        if self.login.trim().is_empty() {
            return Err(ApiError::InvalidRequest("login must not be empty".into()));
        }
        if self.password.char_count() < MIN_PASSWORD_CHARS {
            return Err(ApiError::InvalidRequest(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &self.password)
            .finish()
    }
}

/// Body of `POST /auth/refresh` and `POST /auth/logout`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Token pair issued by login and refresh.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    pub user: User,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user.login)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_serialize_password_but_debug_redacts() {
        let credentials = Credentials::new("ivanov", "hunter22");
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["login"], "ivanov");
        assert_eq!(json["password"], "hunter22");

        let debug = format!("{credentials:?}");
        assert!(debug.contains("ivanov"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(Credentials::new("ivanov", "12345").validate().is_err());
        assert!(Credentials::new("  ", "123456").validate().is_err());
        assert!(Credentials::new("ivanov", "123456").validate().is_ok());
        // characters, not bytes
        assert!(Credentials::new("ivanov", "пароль").validate().is_ok());
    }

    #[test]
    fn refresh_body_is_camel_case() {
        let body = serde_json::to_string(&RefreshRequest { refresh_token: "rt" }).unwrap();
        assert_eq!(body, r#"{"refreshToken":"rt"}"#);
    }

    #[test]
    fn auth_response_debug_hides_tokens() {
        let json = r#"{
            "accessToken": "at_secret",
            "refreshToken": "rt_secret",
            "expiresIn": 900,
            "user": {
                "id": "u1", "login": "ivanov", "role": "student",
                "firstName": "Ivan", "lastName": "Ivanov",
                "classRoomId": "c1",
                "createdAt": "2025-01-10T08:00:00.000Z",
                "updatedAt": "2025-01-10T08:00:00.000Z"
            }
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.expires_in, 900);
        let debug = format!("{response:?}");
        assert!(!debug.contains("at_secret"));
        assert!(!debug.contains("rt_secret"));
    }
}

//! Authenticated request client
//!
//! Per authenticated call:
//!
//! ```text
//! NO_TOKEN  -> fail 401 (nothing sent)
//! HAS_TOKEN -> SEND -> 2xx   -> DONE
//!                   -> 401   -> REFRESH -> token -> RETRY -> DONE
//!                                       -> none  -> DONE(session expired)
//!                   -> other -> DONE(error)
//! ```
//!
//! The retry happens at most once whatever its status, and always uses the
//! token the refresh just produced.

use std::sync::Arc;

use gradebook_auth::{StoredTokens, TokenStore};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::constants::{LOGIN_ENDPOINT, LOGOUT_ENDPOINT};
use crate::error::{ApiError, Result};
use crate::metrics;
use crate::models::{AuthResponse, Credentials, RefreshRequest};
use crate::refresh::SessionRefresher;
use crate::transport::{HttpTransport, RawResponse, RequestOptions};

struct Inner {
    transport: HttpTransport,
    tokens: Arc<dyn TokenStore>,
    refresher: SessionRefresher,
}

/// Client for the gradebook backend. Clones share the token store and the
/// in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(transport: HttpTransport, tokens: Arc<dyn TokenStore>) -> Self {
        let refresher = SessionRefresher::new(transport.clone(), Arc::clone(&tokens));
        Self {
            inner: Arc::new(Inner {
                transport,
                tokens,
                refresher,
            }),
        }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.inner.transport
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    /// Authenticated call with one retry after a successful refresh.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let result = self.send_authenticated(endpoint, &options).await;
        metrics::record_request(true, result.as_ref().map(|_| ()));
        result
    }

    /// Call without a bearer token (login, logout).
    pub async fn request_public<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let result = match self.inner.transport.send(endpoint, &options, None).await {
            Ok(response) => finish(response, endpoint),
            Err(e) => Err(e),
        };
        metrics::record_request(false, result.as_ref().map(|_| ()));
        result
    }

    async fn send_authenticated<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        let Some(token) = self.inner.tokens.get().await.access_token else {
            debug!(endpoint, "no access token stored, request not sent");
            return Err(ApiError::no_access_token(endpoint));
        };

        let response = self
            .inner
            .transport
            .send(endpoint, options, Some(&token))
            .await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return finish(response, endpoint);
        }

        debug!(endpoint, "access token rejected, refreshing session");
        let Some(fresh) = self.inner.refresher.refresh().await else {
            warn!(endpoint, "session could not be renewed");
            return Err(ApiError::SessionExpired {
                path: endpoint.to_string(),
            });
        };

        let retried = self
            .inner
            .transport
            .send(endpoint, options, Some(&fresh))
            .await?;
        finish(retried, endpoint)
    }

    /// Log in and store the issued token pair.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let options = RequestOptions::post().json(credentials)?;
        let auth: AuthResponse = self.request_public(LOGIN_ENDPOINT, options).await?;
        self.inner
            .tokens
            .set(&auth.access_token, &auth.refresh_token)
            .await?;
        info!(user_id = %auth.user.id, role = auth.user.role.as_str(), "logged in");
        Ok(auth)
    }

    /// Best-effort server logout, then unconditionally clear local tokens.
    ///
    /// Never fails; calling it again with no session is a no-op.
    pub async fn logout(&self) {
        let StoredTokens { refresh_token, .. } = self.inner.tokens.get().await;
        if let Some(refresh_token) = refresh_token {
            if let Err(e) = self.notify_logout(&refresh_token).await {
                warn!(error = %e, "logout request failed, clearing local session anyway");
            }
        }
        self.inner.tokens.clear().await;
        info!("logged out");
    }

    async fn notify_logout(&self, refresh_token: &str) -> Result<()> {
        let options = RequestOptions::post().json(&RefreshRequest { refresh_token })?;
        self.request_public::<Value>(LOGOUT_ENDPOINT, options).await?;
        Ok(())
    }

    /// Whether an access token is currently stored.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.tokens.get().await.access_token.is_some()
    }
}

fn finish<T: DeserializeOwned>(response: RawResponse, endpoint: &str) -> Result<T> {
    if response.is_success() {
        response.json(endpoint)
    } else {
        Err(response.into_error(endpoint))
    }
}

//! Request-time session refresh
//!
//! When the backend rejects an access token, the refresh token is exchanged
//! for a new pair. Concurrent callers that hit a 401 while an exchange is
//! running attach to it through `SingleFlight` instead of starting their own,
//! so a rotated refresh token is never spent twice.
//!
//! A failed exchange always invalidates the session: the token store is
//! cleared and every attached caller receives `None`.

use std::sync::Arc;

use gradebook_auth::{StoredTokens, TokenStore};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::constants::REFRESH_ENDPOINT;
use crate::error::{ApiError, Result};
use crate::metrics::{self, RefreshOutcome};
use crate::models::RefreshRequest;
use crate::single_flight::SingleFlight;
use crate::transport::{HttpTransport, RequestOptions};

/// The part of the refresh response the client relies on.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewedTokens {
    access_token: String,
    refresh_token: String,
}

/// Exchanges the stored refresh token, at most one exchange at a time.
#[derive(Clone)]
pub struct SessionRefresher {
    transport: HttpTransport,
    tokens: Arc<dyn TokenStore>,
    flight: SingleFlight<Option<String>>,
}

impl SessionRefresher {
    pub fn new(transport: HttpTransport, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            transport,
            tokens,
            flight: SingleFlight::new(),
        }
    }

    /// Obtain a new access token, or `None` when the session is gone.
    ///
    /// Joins the exchange already in flight if there is one.
    pub async fn refresh(&self) -> Option<String> {
        let transport = self.transport.clone();
        let tokens = Arc::clone(&self.tokens);
        let (token, leader) = self
            .flight
            .run(move || exchange(transport, tokens))
            .await;
        if !leader {
            debug!(renewed = token.is_some(), "joined in-flight token refresh");
        }
        token
    }

    /// Whether an exchange is currently running.
    pub fn in_flight(&self) -> bool {
        self.flight.in_flight()
    }
}

async fn exchange(transport: HttpTransport, tokens: Arc<dyn TokenStore>) -> Option<String> {
    let StoredTokens { refresh_token, .. } = tokens.get().await;
    let Some(refresh_token) = refresh_token else {
        debug!("no refresh token stored, session cannot be renewed");
        metrics::record_refresh(RefreshOutcome::NoRefreshToken);
        return None;
    };

    let renewed = match request_new_pair(&transport, &refresh_token).await {
        Ok(renewed) => renewed,
        Err(e) => {
            warn!(error = %e, status = e.status(), "token refresh failed, clearing session");
            tokens.clear().await;
            metrics::record_refresh(RefreshOutcome::Failed);
            return None;
        }
    };

    if let Err(e) = tokens
        .set(&renewed.access_token, &renewed.refresh_token)
        .await
    {
        warn!(error = %e, "failed to persist refreshed tokens, clearing session");
        tokens.clear().await;
        metrics::record_refresh(RefreshOutcome::Failed);
        return None;
    }

    info!("session refreshed");
    metrics::record_refresh(RefreshOutcome::Renewed);
    Some(renewed.access_token)
}

async fn request_new_pair(transport: &HttpTransport, refresh_token: &str) -> Result<RenewedTokens> {
    let options = RequestOptions::post().json(&RefreshRequest { refresh_token })?;
    let response = transport.send(REFRESH_ENDPOINT, &options, None).await?;
    if !response.is_success() {
        return Err(response.into_error(REFRESH_ENDPOINT));
    }
    let renewed: RenewedTokens = response.json(REFRESH_ENDPOINT)?;
    if renewed.access_token.is_empty() || renewed.refresh_token.is_empty() {
        return Err(ApiError::Decode {
            path: REFRESH_ENDPOINT.to_string(),
            reason: "refresh response carried an empty token".into(),
        });
    }
    Ok(renewed)
}

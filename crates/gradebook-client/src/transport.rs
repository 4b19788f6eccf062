//! HTTP transport
//!
//! Sends one request with a timeout and reads the whole body. Every
//! failure that happens before a response arrives is reported as
//! `ApiError::Network`; status handling is left to the request client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::constants::REQUEST_ID_HEADER;
use crate::error::{ApiError, ApiErrorBody, NetworkErrorKind, Result};
use crate::metrics;

/// Method, query, headers and JSON body of one call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("serializing request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// A fully read response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
    pub request_id: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode a success body. An empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Turn a non-2xx response into `ApiError::Request`.
    pub fn into_error(self, path: &str) -> ApiError {
        let body =
            ApiErrorBody::from_response_body(self.status, &self.body, path, &self.request_id);
        ApiError::Request {
            status: self.status.as_u16(),
            body,
        }
    }
}

/// Issues requests against the backend base URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(client, base_url, timeout))
    }

    /// Share an existing connection pool.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, endpoint: &str, query: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| ApiError::InvalidRequest(format!("invalid URL for {endpoint}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send one request, optionally with a bearer token, and read the body.
    #[instrument(skip_all, fields(method = %options.method, endpoint = endpoint, request_id = tracing::field::Empty))]
    pub async fn send(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        bearer: Option<&str>,
    ) -> Result<RawResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let url = self.url(endpoint, &options.query)?;
        let mut builder = self
            .client
            .request(options.method.clone(), url)
            .timeout(self.timeout)
            .headers(options.headers.clone())
            .header(REQUEST_ID_HEADER, request_id.as_str());
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(&e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(&e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            body,
            request_id,
        })
    }

    /// Map a reqwest failure to a network error with a message for users.
    fn classify(&self, err: &reqwest::Error) -> ApiError {
        if err.is_builder() {
            return ApiError::InvalidRequest(err.to_string());
        }
        let (kind, message) = if err.is_timeout() {
            (
                NetworkErrorKind::Timeout,
                format!(
                    "Request timed out. Check that the server at {} is reachable",
                    self.base_url
                ),
            )
        } else if err.is_connect() {
            (
                NetworkErrorKind::Connect,
                format!("Could not connect to the server at {}", self.base_url),
            )
        } else {
            (NetworkErrorKind::Other, format!("Network error: {err}"))
        };
        warn!(kind = kind.label(), error = %err, "request failed before a response arrived");
        metrics::record_network_error(kind.label());
        ApiError::Network { kind, message }
    }
}

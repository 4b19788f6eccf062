//! Gradebook backend client
//!
//! Request pipeline, leaf first:
//! - `transport`: one HTTP call with a timeout; failures before a response
//!   become `ApiError::Network`
//! - `refresh`: exchanges the refresh token, one exchange in flight at a time
//! - `client`: bearer attachment, refresh on 401 and a single retry
//! - `endpoints`: typed methods for each `/api/v1` route
//!
//! Tokens live behind `gradebook_auth::TokenStore`.

pub mod client;
pub mod constants;
pub mod endpoints;
pub mod error;
pub mod metrics;
pub mod models;
pub mod refresh;
pub mod single_flight;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use constants::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiError, ApiErrorBody, ErrorMessage, NetworkErrorKind, Result};
pub use refresh::SessionRefresher;
pub use single_flight::SingleFlight;
pub use transport::{HttpTransport, RawResponse, RequestOptions};

//! Local session persistence for the gradebook client
//!
//! Provides the durable key-value file that stands in for the device's
//! local storage, and the token store built on top of it. The access and
//! refresh tokens are the only session state kept on disk; whether a user
//! is "logged in" is derived from the presence of an access token.
//!
//! Storage layout (one JSON object):
//! - `accessToken`: short-lived bearer token
//! - `refreshToken`: long-lived token exchanged for new access tokens
//! - `settings-storage`: persisted user settings (owned by the core crate)

pub mod constants;
pub mod error;
pub mod storage;
pub mod token_store;

pub use constants::*;
pub use error::{Error, Result};
pub use storage::LocalStorage;
pub use token_store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};

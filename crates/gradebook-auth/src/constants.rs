//! Storage keys and file names
//!
//! Key names match what the backend-facing client has always written so an
//! existing storage file keeps working across releases.

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the persisted settings object
pub const SETTINGS_KEY: &str = "settings-storage";

/// Default file name for the local storage file
pub const STORAGE_FILE_NAME: &str = "storage.json";

//! Configuration types and loading
//!
//! Precedence: CLI args > env vars > config file > defaults. Every field is
//! optional, so running without a config file works against the hosted
//! backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gradebook_auth::STORAGE_FILE_NAME;
use gradebook_client::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use serde::Deserialize;

/// Env var naming the config file
pub const CONFIG_PATH_ENV: &str = "GRADEBOOK_CONFIG";

const CONFIG_FILE_NAME: &str = "gradebook.toml";
const APP_DIR: &str = "gradebook";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Local storage settings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file; defaults to `<data dir>/gradebook/storage.json`
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load the file at `path` (defaults when `None`), overlay the
    /// environment and the CLI base URL, then validate.
    pub fn load(path: Option<&Path>, cli_base_url: Option<&str>) -> common::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => Config::default(),
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.api.base_url = url.trim().to_string();
            }
        }
        if let Some(url) = cli_base_url {
            config.api.base_url = url.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(common::Error::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Storage file from config, else the platform data directory.
    pub fn storage_path(&self) -> common::Result<PathBuf> {
        if let Some(ref path) = self.storage.path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(STORAGE_FILE_NAME))
            .ok_or_else(|| {
                common::Error::Config(
                    "could not determine a data directory; set [storage] path".into(),
                )
            })
    }

    /// Resolve the config file from the CLI arg, `GRADEBOOK_CONFIG`, or the
    /// platform config directory. `None` when no file applies.
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(p));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("gradebook.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(BASE_URL_ENV) };

        let config = Config::load(None, None).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn file_values_are_used() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(BASE_URL_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "http://localhost:3000"
timeout_secs = 5

[storage]
path = "/tmp/gradebook-test/storage.json"
"#,
        );

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(
            config.storage_path().unwrap(),
            PathBuf::from("/tmp/gradebook-test/storage.json")
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(BASE_URL_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\ntimeout_secs = 10\n");

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"http://file:3000\"\n");

        unsafe { set_env(BASE_URL_ENV, "http://env:3000") };
        let from_env = Config::load(Some(&path), None).unwrap();
        assert_eq!(from_env.api.base_url, "http://env:3000");

        let from_cli = Config::load(Some(&path), Some("http://cli:3000")).unwrap();
        assert_eq!(from_cli.api.base_url, "http://cli:3000");
        unsafe { remove_env(BASE_URL_ENV) };
    }

    #[test]
    fn invalid_base_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(BASE_URL_ENV) };

        let err = Config::load(None, Some("localhost:3000")).unwrap_err();
        assert!(
            err.to_string().contains("base_url must start with http"),
            "got: {err}"
        );
    }

    #[test]
    fn zero_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env(BASE_URL_ENV) };
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[api]\ntimeout_secs = 0\n");

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, common::Error::InvalidValue { field: "timeout_secs", .. }));
    }

    #[test]
    fn missing_or_invalid_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/gradebook.toml")), None).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(Config::load(Some(&path), None).is_err());
    }

    #[test]
    fn resolve_path_prefers_cli_then_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env(CONFIG_PATH_ENV, "/env/gradebook.toml") };
        assert_eq!(
            Config::resolve_path(Some("/cli/gradebook.toml")),
            Some(PathBuf::from("/cli/gradebook.toml"))
        );
        assert_eq!(
            Config::resolve_path(None),
            Some(PathBuf::from("/env/gradebook.toml"))
        );
        unsafe { remove_env(CONFIG_PATH_ENV) };
    }
}

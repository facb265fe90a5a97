use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    pub server_version: String,

    /// Upper bound (seconds) on a single object-store get or put.
    pub store_timeout_secs: u64,

    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            store_timeout_secs: 10,
            storage: StorageConfig::default(),
        }
    }
}

/// R2/S3 connection settings. Any missing piece leaves storage disabled.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    /// Cloudflare account id; used to derive the endpoint when none is given.
    pub account_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            endpoint: None,
            account_id: None,
            access_key_id: None,
            secret_access_key: None,
            region: "auto".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.account_id
                .as_ref()
                .map(|id| format!("https://{id}.r2.cloudflarestorage.com"))
        })
    }
}

// Keeps the secret out of the startup log line.
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.resolved_endpoint())
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<set>"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<set>"))
            .field("region", &self.region)
            .finish()
    }
}

impl AppConfig {
    /// Load `config.json` if one can be found, then apply environment overrides.
    ///
    /// Lookup order: `$CHINANEWS_CONFIG`, `./config.json`, next to the
    /// executable, one level above it. No file at all means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match locate_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        cfg.apply_env(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str::<AppConfig>(&file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `R2_*`, `PORT` and `LOG_LEVEL`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = &mut self.storage;
        for (key, slot) in [
            ("R2_BUCKET_NAME", &mut storage.bucket),
            ("R2_ENDPOINT", &mut storage.endpoint),
            ("R2_ACCOUNT_ID", &mut storage.account_id),
            ("R2_ACCESS_KEY_ID", &mut storage.access_key_id),
            ("R2_SECRET_ACCESS_KEY", &mut storage.secret_access_key),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        }

        if let Some(region) = lookup("R2_REGION").filter(|v| !v.is_empty()) {
            storage.region = region;
        }
        if storage.region.is_empty() {
            storage.region = "auto".to_string();
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }

        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "PORT",
                value: port,
            })?;
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

fn locate_config_file() -> Option<PathBuf> {
    if let Ok(path) = env::var("CHINANEWS_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let mut candidates = vec![PathBuf::from("config.json")];
    if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        candidates.push(exe_dir.join("config.json"));
        candidates.push(exe_dir.join("..").join("config.json"));
    }

    candidates.into_iter().find(|p| p.exists())
}

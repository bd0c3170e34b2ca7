use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8001/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const APP_DIR_NAME: &str = "llm-chat-client";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Runtime configuration, read once at bootstrap.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Fixed base address every API path is appended to (includes `/api/v1`).
    pub api_base_url: String,
    /// Applies to every non-streaming request.
    pub request_timeout: Duration,
    pub storage_path: PathBuf,
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_path: default_storage_path(),
            environment: Environment::Production,
        }
    }
}

impl AppConfig {
    /// Reads `API_BASE_URL`, `API_TIMEOUT_SECS`, `STORAGE_PATH` and `APP_ENV`.
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = lookup("API_BASE_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                return Err(AppError::Config("API_BASE_URL cannot be empty".to_string()));
            }
            config.api_base_url = url;
        }

        if let Some(secs) = lookup("API_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                AppError::Config(format!("API_TIMEOUT_SECS must be a number of seconds, got '{secs}'"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }

        if let Some(env) = lookup("APP_ENV") {
            config.environment = match env.trim().to_lowercase().as_str() {
                "development" | "dev" => Environment::Development,
                _ => Environment::Production,
            };
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("storage.json")
}

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Origins allowed by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub app_env: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub database_path: String,
    pub cors_origins: CorsOrigins,
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("app_env", &self.app_env)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("database_path", &self.database_path)
            .field("cors_origins", &self.cors_origins)
            .field("storage_dir", &self.storage_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let app_env = value_or_default(&lookup, "APP_ENV", "dev").to_ascii_lowercase();
        let is_dev = app_env == "dev";

        let bind_addr = match optional_trimmed(&lookup, "NOTES_API_BIND_ADDR") {
            Some(addr) => addr,
            None => {
                let port = optional_trimmed(&lookup, "PORT")
                    .or_else(|| optional_trimmed(&lookup, "APP_PORT"))
                    .unwrap_or_else(|| "8080".to_string());
                let port = port.parse::<u16>().map_err(|_| {
                    ConfigError::Invalid("PORT/APP_PORT must be an integer in [0, 65535]".to_string())
                })?;
                format!("0.0.0.0:{port}")
            }
        };

        let jwt_secret = match optional_trimmed(&lookup, "JWT_SECRET") {
            Some(secret) if secret == DEV_JWT_SECRET && !is_dev => {
                return Err(ConfigError::Invalid(
                    "JWT_SECRET must be changed outside the dev environment".to_string(),
                ));
            }
            Some(secret) => secret,
            None if is_dev => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::MissingVar("JWT_SECRET")),
        };

        let token_ttl_secs = value_or_default(&lookup, "TOKEN_TTL_SECS", "86400")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "TOKEN_TTL_SECS must be an integer in [60, 2592000]".to_string(),
                )
            })?;
        if !(60..=2_592_000).contains(&token_ttl_secs) {
            return Err(ConfigError::Invalid(
                "TOKEN_TTL_SECS must be in [60, 2592000]".to_string(),
            ));
        }

        let database_path = value_or_default(&lookup, "DATABASE_PATH", "./data/notes.db");
        let storage_dir = PathBuf::from(value_or_default(&lookup, "STORAGE_DIR", "./data/storage"));
        let cors_origins = parse_cors_origins(&value_or_default(&lookup, "CORS_ALLOW_ORIGINS", "*"));

        let max_upload_bytes = value_or_default(&lookup, "MAX_UPLOAD_BYTES", "10485760")
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::Invalid("MAX_UPLOAD_BYTES must be a positive integer".to_string())
            })?;
        if max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "MAX_UPLOAD_BYTES must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            app_env,
            jwt_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
            database_path,
            cors_origins,
            storage_dir,
            max_upload_bytes,
        })
    }
}

fn parse_cors_origins(raw: &str) -> CorsOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect();

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        CorsOrigins::Any
    } else {
        CorsOrigins::List(origins)
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

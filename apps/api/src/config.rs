use std::time::Duration;

use anyhow::{Context, Result};

use crate::intake::extract::DEFAULT_EXTRACTION_TIMEOUT;
use crate::intake::validator::{ValidationOptions, DEFAULT_MAX_SIZE};

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// General upload cap in bytes. DOCX uploads are further capped at 2 MiB.
    pub max_upload_bytes: usize,
    pub strict_validation: bool,
    pub extraction_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_SIZE,
            strict_validation: true,
            extraction_timeout_secs: DEFAULT_EXTRACTION_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            port: parse_env("PORT", defaults.port).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            strict_validation: parse_env("STRICT_VALIDATION", defaults.strict_validation)
                .context("STRICT_VALIDATION must be true or false")?,
            extraction_timeout_secs: parse_env(
                "EXTRACTION_TIMEOUT_SECS",
                defaults.extraction_timeout_secs,
            )
            .context("EXTRACTION_TIMEOUT_SECS must be a whole number of seconds")?,
        })
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            max_size: self.max_upload_bytes,
            strict_validation: self.strict_validation,
        }
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for environment variable '{key}'")),
        Err(_) => Ok(default),
    }
}

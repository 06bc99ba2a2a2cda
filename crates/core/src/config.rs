//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.

use crate::{AdvisorError, AdvisorResult};
use std::path::{Path, PathBuf};
use std::{env, fmt::Display, str::FromStr};
use tracing::info;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 5000;
/// Default session slot storage directory.
pub const DEFAULT_DATA_DIR: &str = "session_data";
/// Default completion provider endpoint base.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com/v1";
/// Default multimodal completion model.
pub const DEFAULT_MODEL: &str = "chatgpt-4o-latest";
/// Default allowed CORS origin (the dev frontend).
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Settings for the outbound completion provider call.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Service configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct Config {
    port: u16,
    data_dir: PathBuf,
    allowed_origins: Vec<String>,
    provider: ProviderConfig,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Environment variables
    /// - `OPENAI_API_KEY` (required): provider API key
    /// - `OPENAI_BASE_URL`: provider endpoint base
    /// - `ADVISOR_MODEL`: completion model name
    /// - `PORT`: HTTP listen port
    /// - `ALLOWED_ORIGINS`: comma-separated CORS origin list
    /// - `ADVISOR_DATA_DIR`: session slot directory
    ///
    /// # Errors
    /// Returns `AdvisorError::InvalidInput` if the API key is missing or an
    /// override fails to parse.
    pub fn from_env() -> AdvisorResult<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AdvisorError::InvalidInput("OPENAI_API_KEY is not set".into()))?;

        let port = try_load("PORT", DEFAULT_PORT)?;
        let data_dir =
            PathBuf::from(env::var("ADVISOR_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into()));

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_owned())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec![DEFAULT_ALLOWED_ORIGIN.to_owned()]);

        let provider = ProviderConfig {
            api_key,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.into()),
            model: env::var("ADVISOR_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        };

        Ok(Self {
            port,
            data_dir,
            allowed_origins,
            provider,
        })
    }

    /// Constructs a config directly, for tests and embedding.
    pub fn new(
        port: u16,
        data_dir: PathBuf,
        allowed_origins: Vec<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            port,
            data_dir,
            allowed_origins,
            provider,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }
}

fn try_load<T: FromStr>(key: &str, default: T) -> AdvisorResult<T>
where
    T: Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| AdvisorError::InvalidInput(format!("invalid {key} value: {e}"))),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

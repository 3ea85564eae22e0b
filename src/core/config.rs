use std::env;
use std::time::Duration;

use url::Url;

use crate::errors::IngestError;

pub const DEFAULT_DOCS_API_PATH: &str = "/api/documents";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Settings for the DLQ status reporter Lambda.
#[derive(Debug, Clone)]
pub struct DlqConfig {
    pub alb_base_url: String,
    pub docs_api_path: String,
    pub ingestion_token_id: String,
    pub origin_verify_id: Option<String>,
    pub http_timeout: Duration,
}

impl DlqConfig {
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = required(&lookup, "ALB_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| IngestError::ConfigError(format!("ALB_BASE_URL: {e}")))?;

        Ok(Self {
            alb_base_url: base_url.trim_end_matches('/').to_string(),
            docs_api_path: optional(&lookup, "DOCS_API_PATH")
                .unwrap_or_else(|| DEFAULT_DOCS_API_PATH.to_string()),
            ingestion_token_id: required(&lookup, "INGESTION_API_TOKEN_ARN")?,
            origin_verify_id: optional(&lookup, "ORIGIN_VERIFY_ARN"),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HTTP_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        })
    }
}

/// Settings for the pgvector initializer Lambda.
#[derive(Debug, Clone)]
pub struct DbInitConfig {
    pub endpoint: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password_secret_id: String,
    pub connect_timeout: Duration,
}

impl DbInitConfig {
    pub fn from_env() -> Result<Self, IngestError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: required(&lookup, "DB_ENDPOINT")?,
            port: parse_or(&lookup, "DB_PORT", DEFAULT_DB_PORT)?,
            database: required(&lookup, "DB_NAME")?,
            user: required(&lookup, "DB_USER")?,
            password_secret_id: required(&lookup, "DB_PASSWORD_SECRET_ARN")?,
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        })
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String, IngestError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name)
        .ok_or_else(|| IngestError::ConfigError(format!("{name}: environment variable not set")))
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, IngestError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| IngestError::ConfigError(format!("{name}: {e}"))),
        None => Ok(default),
    }
}

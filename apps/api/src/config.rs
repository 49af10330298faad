use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub logs: LogConfig,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
}

/// Object storage settings. `endpoint` is set for MinIO/local deployments.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

/// Log lifecycle settings: where active logs live, where archives go, and
/// how long each tier keeps them.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub s3_prefix: String,
    pub local_retention_days: u32,
    pub remote_retention_days: u32,
    /// 0 disables the in-process maintenance loop (cron drives the cycle).
    pub maintenance_interval_secs: u64,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            database_url: require(&lookup, "DATABASE_URL")?,
            storage: StorageConfig::from_lookup(&lookup)?,
            llm: LlmConfig::from_lookup(&lookup),
            logs: LogConfig::from_lookup(&lookup)?,
            port: parse_or(&lookup, "PORT", 8080u16)?,
            rust_log: optional(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(StorageConfig {
            bucket: require(lookup, "S3_BUCKET")?,
            endpoint: optional(lookup, "S3_ENDPOINT"),
            region: optional(lookup, "AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            access_key_id: optional(lookup, "AWS_ACCESS_KEY_ID"),
            secret_access_key: optional(lookup, "AWS_SECRET_ACCESS_KEY"),
        })
    }
}

impl LlmConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        LlmConfig {
            groq_api_key: optional(lookup, "GROQ_API_KEY"),
            openai_api_key: optional(lookup, "OPENAI_API_KEY"),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let local_retention_days = parse_or(lookup, "LOG_LOCAL_RETENTION_DAYS", 30u32)?;
        let remote_retention_days = parse_or(lookup, "LOG_REMOTE_RETENTION_DAYS", 180u32)?;
        if local_retention_days == 0 || remote_retention_days == 0 {
            bail!("Log retention days must be at least 1");
        }

        Ok(LogConfig {
            dir: PathBuf::from(optional(lookup, "LOG_DIR").unwrap_or_else(|| "logs".to_string())),
            s3_prefix: optional(lookup, "LOG_S3_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_else(|| "logs".to_string()),
            local_retention_days,
            remote_retention_days,
            maintenance_interval_secs: parse_or(lookup, "LOG_MAINTENANCE_INTERVAL_SECS", 0u64)?,
        })
    }

    /// Warns when remote archives would expire before their local copies.
    /// Call once a subscriber is installed; returns whether it warned.
    pub fn warn_if_inconsistent(&self) -> bool {
        let inconsistent = self.remote_retention_days < self.local_retention_days;
        if inconsistent {
            tracing::warn!(
                local_retention_days = self.local_retention_days,
                remote_retention_days = self.remote_retention_days,
                "Remote log retention is shorter than local retention"
            );
        }
        inconsistent
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    optional(lookup, key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Blank values count as unset.
fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

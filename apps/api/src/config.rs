use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MAX_RESUMES: usize = 1000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_resumes_per_batch: usize,
    pub batch_workers: usize,
    /// Wall-clock budget per batch. `None` means unbounded.
    pub batch_timeout_secs: Option<u64>,
    pub max_upload_bytes: usize,
    /// Replaces the built-in skill vocabulary when set.
    pub skill_vocabulary_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Ok(Config {
            port: parse_or("PORT", &lookup, 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_resumes_per_batch: parse_or("MAX_RESUMES_PER_BATCH", &lookup, DEFAULT_MAX_RESUMES)?,
            batch_workers: parse_or("BATCH_WORKERS", &lookup, default_workers)?.max(1),
            batch_timeout_secs: lookup("BATCH_TIMEOUT_SECS")
                .map(|v| {
                    v.parse::<u64>()
                        .context("BATCH_TIMEOUT_SECS must be a whole number of seconds")
                })
                .transpose()?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", &lookup, DEFAULT_MAX_UPLOAD_BYTES)?,
            skill_vocabulary_path: lookup("SKILL_VOCABULARY_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}

use std::env;
use std::time::Duration;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Remote store; when unset the service runs on the local cache alone.
    pub database_url: Option<String>,
    pub local_store_dir: String,
    pub log_dir: String,

    /// Operational timezone as minutes east of UTC (Lima is -300).
    pub utc_offset_minutes: i32,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_api_per_min: u32,

    pub api_prefix: String,

    /// Seconds between local/remote syncs; 0 syncs once at startup only.
    pub sync_interval_secs: u64,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .trim()
        .parse()
        .with_context(|| format!("{key} is not a valid value"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:8080"),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            local_store_dir: var_or("LOCAL_STORE_DIR", "data"),
            log_dir: var_or("LOG_DIR", "logs"),

            utc_offset_minutes: parse_var("UTC_OFFSET_MINUTES", "-300")?, // America/Lima

            rate_scan_per_min: parse_var("RATE_SCAN_PER_MIN", "120")?,
            rate_api_per_min: parse_var("RATE_API_PER_MIN", "1000")?,

            api_prefix: var_or("API_PREFIX", "/api"),

            sync_interval_secs: parse_var("SYNC_INTERVAL_SECS", "300")?,
        })
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES {} is out of range", self.utc_offset_minutes))
    }

    pub fn sync_interval(&self) -> Option<Duration> {
        (self.sync_interval_secs > 0).then(|| Duration::from_secs(self.sync_interval_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".into(),
            database_url: None,
            local_store_dir: "data".into(),
            log_dir: "logs".into(),
            utc_offset_minutes: -300,
            rate_scan_per_min: 120,
            rate_api_per_min: 1000,
            api_prefix: "/api".into(),
            sync_interval_secs: 300,
        }
    }
}

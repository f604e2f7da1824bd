//! Configuration file parsing and environment overrides.
//!
//! Precedence (highest first): CLI flags, `TF_*` environment variables,
//! the TOML file named by `--config` / `TF_CONFIG`, built-in defaults.
//! The CLI applies these layers onto a [`FetchConfig`] in that order.

use crate::error::TitleFetchError;
use crate::types::FetchConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound accepted for an in-flight ceiling.
pub const MAX_CONCURRENCY: usize = 10_000;

/// Configuration loaded from a TOML file.
///
/// ```toml
/// [defaults]
/// timeout = "10s"
/// concurrency = 50
/// batch_size = 20
/// verify_tls = false
/// proxy = "http://127.0.0.1:8080"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Per-request timeout (as string, e.g. "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Ceiling on simultaneous requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// URLs per dispatch unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Verify TLS certificates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_tls: Option<bool>,

    /// Proxy URL used when `-p` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl FileConfig {
    /// Proxy URL from the file, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.proxy.as_deref())
    }

    /// Layer file values over `config`.
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(concurrency) = defaults.concurrency {
            config.max_in_flight = Some(concurrency);
        }
        if let Some(batch_size) = defaults.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(verify) = defaults.verify_tls {
            config.accept_invalid_certs = !verify;
        }

        config
    }
}

/// Loads and validates configuration files.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FileConfig, TitleFetchError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            TitleFetchError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        Self::validate_config(&config)?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate_config(config: &FileConfig) -> Result<(), TitleFetchError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                return Err(TitleFetchError::config(format!(
                    "Concurrency must be between 1 and {}",
                    MAX_CONCURRENCY
                )));
            }
        }

        if defaults.batch_size == Some(0) {
            return Err(TitleFetchError::config("Batch size must be at least 1"));
        }

        if let Some(timeout_str) = &defaults.timeout {
            if !matches!(parse_timeout_string(timeout_str), Some(secs) if secs > 0) {
                return Err(TitleFetchError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                    timeout_str
                )));
            }
        }

        Ok(())
    }
}

/// Configuration values taken from `TF_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub batch_size: Option<usize>,
    pub verify_tls: Option<bool>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Layer environment values over `config`.
    pub fn apply_to(&self, mut config: FetchConfig) -> FetchConfig {
        if let Some(timeout) = self.timeout {
            config.request_timeout = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_in_flight = Some(concurrency);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(verify) = self.verify_tls {
            config.accept_invalid_certs = !verify;
        }
        config
    }
}

/// Load configuration from the process environment.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load `TF_*` configuration through an arbitrary lookup.
///
/// Invalid values are logged and ignored.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("TF_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(secs) if secs > 0 => {
                env_config.timeout = Some(Duration::from_secs(secs));
                debug!("Using TF_TIMEOUT={}", val);
            }
            _ => warn!("Invalid TF_TIMEOUT='{}', use format like '5s', '30s', '2m'", val),
        }
    }

    if let Some(val) = lookup("TF_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_CONCURRENCY).contains(&n) => {
                env_config.concurrency = Some(n);
                debug!("Using TF_CONCURRENCY={}", n);
            }
            _ => warn!(
                "Invalid TF_CONCURRENCY='{}', must be 1-{}",
                val, MAX_CONCURRENCY
            ),
        }
    }

    if let Some(val) = lookup("TF_BATCH_SIZE") {
        match val.trim().parse::<usize>() {
            Ok(n) if n > 0 => {
                env_config.batch_size = Some(n);
                debug!("Using TF_BATCH_SIZE={}", n);
            }
            _ => warn!("Invalid TF_BATCH_SIZE='{}', must be at least 1", val),
        }
    }

    if let Some(val) = lookup("TF_VERIFY_TLS") {
        match parse_bool(&val) {
            Some(verify) => {
                env_config.verify_tls = Some(verify);
                debug!("Using TF_VERIFY_TLS={}", verify);
            }
            None => warn!("Invalid TF_VERIFY_TLS='{}', use true/false", val),
        }
    }

    if let Some(path) = lookup("TF_CONFIG") {
        if !path.trim().is_empty() {
            env_config.config = Some(path);
        }
    }

    env_config
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Values too large to express in
/// seconds are rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

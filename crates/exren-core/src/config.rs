use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Host of the exam archive proxy whose downloads are renamed by default.
pub const EXAM_ARCHIVE_HOST: &str = "exambase-lib-hku-hk.eproxy.lib.hku.hk";

/// Retry policy for messages to the daemon (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per message (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay_ms: 500,
        }
    }
}

/// Global configuration loaded from `~/.config/exren/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExrenConfig {
    /// Age in seconds after which cached metadata is swept.
    pub ttl_secs: u64,
    /// Interval in seconds between cache sweeps while the daemon runs.
    pub sweep_interval_secs: u64,
    /// Hosts whose downloads are renamed. Empty means every host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    /// Directory downloads are saved to (None = the daemon's working directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ExrenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
            allowed_hosts: vec![EXAM_ARCHIVE_HOST.to_string()],
            download_dir: None,
            retry: None,
        }
    }
}

impl ExrenConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match &self.retry {
            Some(r) => RetryPolicy {
                max_attempts: r.max_attempts.max(1),
                delay: Duration::from_millis(r.delay_ms),
            },
            None => RetryPolicy::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("exren")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ExrenConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ExrenConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ExrenConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ExrenConfig::default();
        assert_eq!(cfg.ttl(), Duration::from_secs(1800));
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(300));
        assert_eq!(cfg.allowed_hosts, vec![EXAM_ARCHIVE_HOST.to_string()]);
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn default_retry_is_two_attempts_half_second_apart() {
        let policy = ExrenConfig::default().retry_policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay, Duration::from_millis(500));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ExrenConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ExrenConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.ttl_secs, cfg.ttl_secs);
        assert_eq!(parsed.sweep_interval_secs, cfg.sweep_interval_secs);
        assert_eq!(parsed.allowed_hosts, cfg.allowed_hosts);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            ttl_secs = 60
            sweep_interval_secs = 10
            allowed_hosts = []
            download_dir = "/tmp/exams"

            [retry]
            max_attempts = 3
            delay_ms = 100
        "#;
        let cfg: ExrenConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.ttl(), Duration::from_secs(60));
        assert!(cfg.allowed_hosts.is_empty());
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/tmp/exams")));
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(100));
    }

    #[test]
    fn zero_sweep_interval_is_clamped() {
        let cfg = ExrenConfig {
            sweep_interval_secs: 0,
            ..ExrenConfig::default()
        };
        assert_eq!(cfg.sweep_interval(), Duration::from_secs(1));
    }
}

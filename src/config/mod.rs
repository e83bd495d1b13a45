use anyhow::{Context, Result};
use config::{Config, File};
use log::{debug, LevelFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

/// Environment variable holding the generation API credential.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_iterations() -> u32 {
    10
}

fn default_channel_capacity() -> usize {
    16
}

fn default_mount_points() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_sample_capacity() -> usize {
    3600
}

fn default_suggestion_capacity() -> usize {
    100
}

fn default_cpu_limit() -> f32 {
    80.0
}

fn default_mem_limit() -> f32 {
    80.0
}

fn default_disk_limit() -> f32 {
    90.0
}

fn default_idle_timeout_secs() -> u64 {
    1800
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Number of polling ticks per monitoring run, 0 polls until stopped.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_mount_points")]
    pub mount_points: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            iterations: default_iterations(),
            channel_capacity: default_channel_capacity(),
            mount_points: default_mount_points(),
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn iteration_limit(&self) -> Option<u32> {
        (self.iterations > 0).then_some(self.iterations)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_sample_capacity")]
    pub samples: usize,
    #[serde(default = "default_suggestion_capacity")]
    pub suggestions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            samples: default_sample_capacity(),
            suggestions: default_suggestion_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsConfig {
    #[serde(default = "default_cpu_limit")]
    pub cpu: f32,
    #[serde(default = "default_mem_limit")]
    pub mem: f32,
    #[serde(default = "default_disk_limit")]
    pub disk: f32,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cpu: default_cpu_limit(),
            mem: default_mem_limit(),
            disk: default_disk_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    /// Directory receiving report files, the user's home when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

impl ReportConfig {
    pub fn directory(&self) -> Result<PathBuf, AppError> {
        match self.directory.as_deref() {
            Some(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
            _ => dirs::home_dir().ok_or_else(|| {
                AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "unable to determine the home directory",
                ))
            }),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        Self::from_file("config.ini")
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::from(config_path).format(config::FileFormat::Ini))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }
}

/// Reads the generation API credential from the environment.
pub fn api_key_from_env() -> Result<String, AppError> {
    api_key_from(std::env::var(API_KEY_VAR).ok())
}

/// Validates a raw credential value. Missing or blank values are a
/// configuration error.
pub fn api_key_from(value: Option<String>) -> Result<String, AppError> {
    match value.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(AppError::Config(format!(
            "{API_KEY_VAR} is not set. Export it or add it to your environment before starting."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8501");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.timeout(), Duration::from_secs(30));
        assert_eq!(config.monitor.interval(), Duration::from_secs(1));
        assert_eq!(config.monitor.iteration_limit(), Some(10));
        assert_eq!(config.monitor.mount_points, vec!["/".to_string()]);
        assert_eq!(config.history.samples, 3600);
        assert_eq!(config.thresholds.cpu, 80.0);
        assert_eq!(config.thresholds.disk, 90.0);
        assert!(config.report.directory.is_none());
        assert_eq!(config.get_log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_content = "[server]\nbind = 0.0.0.0:9000\n\n[gemini]\nmodel = gemini-1.5-pro\ntimeout_secs = 5\n\n[monitor]\ninterval_ms = 250\niterations = 0\n\n[thresholds]\ncpu = 70\n\n[report]\ndirectory = /tmp/reports\n\n[logging]\nlevel = debug\n";

        temp_file.write_all(config_content.as_bytes()).unwrap();
        let config = AppConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.timeout(), Duration::from_secs(5));
        assert_eq!(config.monitor.interval(), Duration::from_millis(250));
        assert_eq!(config.monitor.iteration_limit(), None);
        assert_eq!(config.thresholds.cpu, 70.0);
        assert_eq!(config.thresholds.mem, 80.0);
        assert_eq!(
            config.report.directory().unwrap(),
            PathBuf::from("/tmp/reports")
        );
        assert_eq!(config.get_log_level(), LevelFilter::Debug);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::from_file(dir.path().join("absent.ini")).is_err());
    }

    #[test]
    fn test_invalid_log_level_falls_back_to_info() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert_eq!(config.get_log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        for value in [None, Some(String::new()), Some("  \n".to_string())] {
            let err = api_key_from(value).unwrap_err();
            assert!(matches!(err, AppError::Config(ref msg) if msg.contains(API_KEY_VAR)));
            assert_eq!(err.kind(), "config");
        }
    }

    #[test]
    fn test_api_key_is_trimmed() {
        assert_eq!(
            api_key_from(Some(" secret-key\n".to_string())).unwrap(),
            "secret-key"
        );
    }
}

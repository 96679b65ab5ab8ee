//! RON configuration for the `intake` binary.
//!
//! Every field is optional in the file; anything omitted falls back to the
//! defaults of the live site (PDF/DOC/DOCX up to 5 MiB, 100 ms ticks of 5 %,
//! a 1.5 s simulated submission and a 3 s thank-you panel).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use intake_core::UploadPolicy;
use intake_engine::EngineSettings;
use intake_logging::{intake_info, LevelFilter};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "intake.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("could not write {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub accepted_mime_types: Vec<String>,
    pub max_upload_bytes: u64,
    pub tick_interval_ms: u64,
    pub progress_step: u8,
    pub fail_at_percent: Option<u8>,
    pub submit_delay_ms: u64,
    pub reset_delay_ms: u64,
    pub upload_endpoint: Option<String>,
    pub submit_endpoint: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let policy = UploadPolicy::default();
        let engine = EngineSettings::default();
        Self {
            accepted_mime_types: policy.accepted_mime_types,
            max_upload_bytes: policy.max_bytes,
            tick_interval_ms: millis(engine.tick_interval),
            progress_step: engine.progress_step,
            fail_at_percent: engine.fail_at,
            submit_delay_ms: millis(engine.submit_delay),
            reset_delay_ms: millis(engine.reset_delay),
            upload_endpoint: engine.upload_endpoint,
            submit_endpoint: engine.submit_endpoint,
            connect_timeout_ms: millis(engine.connect_timeout),
            request_timeout_ms: millis(engine.request_timeout),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn policy(&self) -> UploadPolicy {
        UploadPolicy {
            accepted_mime_types: self.accepted_mime_types.clone(),
            max_bytes: self.max_upload_bytes,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            progress_step: self.progress_step,
            fail_at: self.fail_at_percent,
            submit_delay: Duration::from_millis(self.submit_delay_ms),
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            upload_endpoint: self.upload_endpoint.clone(),
            submit_endpoint: self.submit_endpoint.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_bytes: self.max_upload_bytes,
        }
    }

    /// Unknown level names fall back to `Info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A missing file is not an error; it yields the defaults.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Atomically writes `config` as pretty RON.
pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let write_err = |message: String| ConfigError::Write {
        path: path.to_path_buf(),
        message,
    };
    let content = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::new())
        .map_err(|err| write_err(err.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|err| write_err(err.to_string()))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|err| write_err(err.to_string()))?;
    tmp.persist(path)
        .map_err(|err| write_err(err.error.to_string()))?;
    intake_info!("Wrote configuration to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("intake.ron");
        fs::write(
            &path,
            r#"(tick_interval_ms: 10, submit_endpoint: Some("http://localhost:9000/submit"))"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(
            config.submit_endpoint.as_deref(),
            Some("http://localhost:9000/submit")
        );
        assert_eq!(config.progress_step, 5);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);

        let settings = config.engine_settings();
        assert_eq!(settings.tick_interval, Duration::from_millis(10));
        assert_eq!(settings.submit_delay, Duration::from_millis(1500));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("intake.ron");
        fs::write(&path, "(tick_interval_ms: \"soon\"").unwrap();

        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn saved_config_loads_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("intake.ron");
        let config = AppConfig {
            fail_at_percent: Some(40),
            log_level: "debug".into(),
            ..AppConfig::default()
        };
        save(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), config);
        assert_eq!(config.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn unknown_log_level_means_info() {
        let config = AppConfig {
            log_level: "chatty".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.log_level(), LevelFilter::Info);
    }
}

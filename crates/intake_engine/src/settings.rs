use std::time::Duration;

use intake_core::MAX_UPLOAD_BYTES;
use url::Url;

use crate::{FailureKind, TransferError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Simulated transport: delay between progress ticks.
    pub tick_interval: Duration,
    /// Simulated transport: percent added per tick.
    pub progress_step: u8,
    /// Simulated transport: fail once progress reaches this percent.
    pub fail_at: Option<u8>,
    /// Simulated endpoint round trip.
    pub submit_delay: Duration,
    /// Display time of the thank-you panel before the form clears.
    pub reset_delay: Duration,
    pub upload_endpoint: Option<String>,
    pub submit_endpoint: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            progress_step: 5,
            fail_at: None,
            submit_delay: Duration::from_millis(1500),
            reset_delay: Duration::from_millis(3000),
            upload_endpoint: None,
            submit_endpoint: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Only absolute http(s) URLs are usable as endpoints.
pub fn parse_endpoint(raw: &str) -> Result<Url, TransferError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| TransferError::new(FailureKind::InvalidEndpoint, err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TransferError::new(
            FailureKind::InvalidEndpoint,
            format!("unsupported scheme {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_site() {
        let settings = EngineSettings::default();
        assert_eq!(settings.tick_interval, Duration::from_millis(100));
        assert_eq!(settings.progress_step, 5);
        assert_eq!(settings.submit_delay, Duration::from_millis(1500));
        assert_eq!(settings.max_bytes, 5_242_880);
    }

    #[test]
    fn endpoints_must_be_http() {
        assert!(parse_endpoint("https://intake.example.com/upload").is_ok());
        assert!(parse_endpoint(" http://localhost:8080/x ").is_ok());
        assert_eq!(
            parse_endpoint("ftp://example.com").unwrap_err().kind,
            FailureKind::InvalidEndpoint
        );
        assert_eq!(
            parse_endpoint("not a url").unwrap_err().kind,
            FailureKind::InvalidEndpoint
        );
    }
}

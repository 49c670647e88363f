//! Configuration validation utilities.

use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use thiserror::Error;

use crate::schedule::ScheduleError;
use crate::storage::StorageError;

/// Configuration error types.
///
/// Raised once at startup; a recorder never sees one mid-loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),

    /// Schedule could not be constructed.
    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    /// A target backend could not be opened.
    #[error("failed to open target: {0}")]
    Storage(#[from] StorageError),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `2h30m`, `1d`, `100ms`, etc.
///
/// # Examples
///
/// ```
/// use market_recorder::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
/// assert_eq!(parse_duration("1m").unwrap().as_secs(), 60);
/// assert_eq!(parse_duration("1h30m").unwrap().as_secs(), 5400);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Parse an IANA timezone name such as `America/New_York`.
pub fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| format!("unknown timezone '{s}'"))
}

/// Parse a local wall-clock time.
///
/// Accepts `HH:MM` and `HH:MM:SS`; seconds are dropped.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(crate::schedule::truncate_to_minute)
        .map_err(|_| format!("invalid clock time '{s}', expected HH:MM"))
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("30").is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("America/New_York").unwrap(), chrono_tz::America::New_York);
        assert_eq!(parse_timezone(" UTC ").unwrap(), chrono_tz::UTC);
        assert!(parse_timezone("Mars/Olympus_Mons").unwrap_err().contains("Mars"));
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(
            parse_clock_time("00:23").unwrap(),
            NaiveTime::from_hms_opt(0, 23, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("16:05:42").unwrap(),
            NaiveTime::from_hms_opt(16, 5, 0).unwrap()
        );
        assert!(parse_clock_time("25:00").is_err());
        assert!(parse_clock_time("noon").is_err());
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("iex"), "iex");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("${NONEXISTENT_RECORDER_KEY_12345:-paper-key}");
        assert_eq!(result, "paper-key");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: This test runs in isolation and only modifies a test-specific variable.
        unsafe {
            std::env::set_var("TEST_RECORDER_SECRET", "secret_value");
        }
        let result = expand_env_vars("${TEST_RECORDER_SECRET}");
        assert_eq!(result, "secret_value");
        // SAFETY: Cleanup test variable.
        unsafe {
            std::env::remove_var("TEST_RECORDER_SECRET");
        }
    }
}

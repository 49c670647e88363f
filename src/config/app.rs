//! Application configuration structures.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::recorder::Recorder;

use super::schedule::ScheduleConfig;
use super::source::SourceConfig;
use super::target::TargetConfig;
use super::validation::ConfigError;

// =============================================================================
// Server Configuration
// =============================================================================

/// Single-shot HTTP surface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 8080).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

// =============================================================================
// Recorder Configuration
// =============================================================================

/// One recorder: what to poll, when, and where to write it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    pub name: String,
    pub symbols: Vec<String>,
    pub source: SourceConfig,
    /// Omitted or empty selects the US equity session.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub targets: Vec<TargetConfig>,
}

impl RecorderConfig {
    /// Validate everything that can be checked without opening a backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| ConfigError::ValidationError(format!("recorder '{}': {msg}", self.name));

        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "recorder name cannot be empty".to_string(),
            ));
        }
        if self.symbols.is_empty() {
            return Err(invalid("symbols cannot be empty".to_string()));
        }
        if let Some(symbol) = self.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(invalid(format!("invalid symbol '{symbol}'")));
        }
        if self.targets.is_empty() {
            return Err(invalid("at least one target is required".to_string()));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name()) {
                return Err(invalid(format!("duplicate target name: '{}'", target.name())));
            }
            target.validate().map_err(|e| invalid(e.to_string()))?;
        }

        self.schedule.to_spec().map_err(|e| invalid(e.to_string()))?;
        self.source.validate().map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Construct the recorder, opening every target.
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid settings or a target backend that
    /// cannot be opened.
    pub async fn build(&self) -> Result<Recorder, ConfigError> {
        self.validate()?;
        let schedule = self.schedule.to_spec()?;
        let source = self.source.build(&self.name)?;

        let now = Utc::now();
        let mut targets = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            targets.push(target.build(now).await?);
        }

        Recorder::new(&self.name, self.symbols.clone(), source, schedule, targets)
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Single-shot HTTP surface configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Recorders, each run independently.
    pub recorders: Vec<RecorderConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        if self.recorders.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one recorder is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for recorder in &self.recorders {
            if !seen.insert(recorder.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate recorder name: '{}'",
                    recorder.name
                )));
            }
            recorder.validate()?;
        }

        Ok(())
    }

    /// Construct every configured recorder.
    pub async fn build_recorders(&self) -> Result<Vec<Recorder>, ConfigError> {
        let mut recorders = Vec::with_capacity(self.recorders.len());
        for config in &self.recorders {
            recorders.push(config.build().await?);
        }
        Ok(recorders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
server:
  bind: 127.0.0.1
  port: 9090
recorders:
  - name: snapshots
    symbols: [SPY, VOO]
    source:
      type: alpaca
      key_id: ${NONEXISTENT_APCA_KEY:-pk}
      secret_key: ${NONEXISTENT_APCA_SECRET:-sk}
    schedule:
      sessions:
        timezone: America/New_York
        default_interval: 1m
        windows:
          - { start: "09:25", end: "16:05", interval: 5s }
    targets:
      - kind: artifact
        name: json
        store: { type: memory }
        prefix: stocks/intraday_data/snapshots_logs
        format: json
        max_bytes: 1000000
        per_day: America/New_York
      - kind: table
        name: warehouse
        url: "sqlite::memory:"
        table: snapshots
  - name: option-quotes
    symbols: [SPY241220C00600000]
    source: { type: alpaca, key_id: k, secret_key: s, endpoint: latest_quotes }
    targets:
      - { kind: artifact, name: csv, store: { type: memory }, prefix: quotes, format: csv }
"#;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.recorders.len(), 2);
        assert_eq!(config.recorders[0].targets.len(), 2);
        assert_eq!(config.recorders[1].schedule, ScheduleConfig::default());
    }

    #[tokio::test]
    async fn test_build_recorders() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let recorders = config.build_recorders().await.unwrap();

        assert_eq!(recorders[0].name(), "snapshots");
        assert_eq!(recorders[0].targets().len(), 2);
        assert_eq!(recorders[1].symbols(), ["SPY241220C00600000".to_string()]);
        for recorder in &recorders {
            recorder.close().await;
        }
    }

    #[test]
    fn test_duplicate_recorder_names() {
        let yaml = SAMPLE.replace("name: option-quotes", "name: snapshots");
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate recorder name"));
    }

    #[test]
    fn test_duplicate_target_names() {
        let yaml = SAMPLE.replace("name: warehouse", "name: json");
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate target name"));
    }

    #[test]
    fn test_recorder_without_targets() {
        let yaml = r#"
recorders:
  - name: r
    symbols: [SPY]
    source: { type: alpaca, key_id: k, secret_key: s }
    targets: []
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("at least one target"));
    }

    #[test]
    fn test_invalid_server_settings() {
        let yaml = format!("server: {{ bind: not-an-ip, port: 8080 }}\n{}", &SAMPLE[SAMPLE.find("recorders:").unwrap()..]);
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("invalid server bind address"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/recorder.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}

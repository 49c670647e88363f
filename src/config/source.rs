//! Market-data source configuration.

use serde::{Deserialize, Serialize};

use crate::source::{MarketSource, SnapshotConfig, SnapshotSource};

use super::validation::{ConfigError, expand_env_vars};

/// Source a recorder polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Alpaca-compatible market-data API.
    Alpaca(SnapshotConfig),
}

impl SourceConfig {
    /// Check the settings after environment expansion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Alpaca(config) => {
                let base_url = expand_env_vars(&config.base_url);
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(ConfigError::ValidationError(format!(
                        "source base_url must be http(s): '{base_url}'"
                    )));
                }
                if config.timeout.is_zero() {
                    return Err(ConfigError::ValidationError(
                        "source timeout must be positive".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Create the source for recorder `name`, expanding `${VAR}` in credentials.
    pub fn build(&self, name: &str) -> Result<Box<dyn MarketSource>, ConfigError> {
        self.validate()?;
        match self {
            Self::Alpaca(config) => {
                let mut config = config.clone();
                config.base_url = expand_env_vars(&config.base_url);
                config.key_id = expand_env_vars(&config.key_id);
                config.secret_key = expand_env_vars(&config.secret_key);
                if config.key_id.is_empty() || config.secret_key.is_empty() {
                    tracing::warn!(recorder = %name, "Source credentials are empty");
                }
                Ok(Box::new(SnapshotSource::new(name, config)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SnapshotEndpoint;

    #[test]
    fn test_parse_alpaca_source() {
        let config: SourceConfig = serde_yaml::from_str(
            "type: alpaca\nkey_id: ${NONEXISTENT_KEY_987:-pk}\nsecret_key: sk\nendpoint: latest_trades\n",
        )
        .unwrap();
        let SourceConfig::Alpaca(snapshot) = &config;
        assert_eq!(snapshot.endpoint, SnapshotEndpoint::LatestTrades);
        assert_eq!(snapshot.feed, "iex");

        let source = config.build("trades").unwrap();
        assert_eq!(source.name(), "trades");
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config: SourceConfig = serde_yaml::from_str(
            "type: alpaca\nkey_id: k\nsecret_key: s\nbase_url: ftp://data\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}

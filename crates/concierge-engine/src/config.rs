//! Configuration for the classifier engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the classifier engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identifier of the classifier logic/version stamped on every result
    pub model_version: String,

    /// Scores within this distance of the category top score are tie-broken
    /// by historical precision
    pub epsilon: f64,

    /// Maximum time for a single strategy call (seconds)
    ///
    /// Bounds external model calls; a strategy that exceeds it is treated
    /// as failed rather than blocking the pipeline.
    pub strategy_timeout_secs: u64,
}

impl EngineConfig {
    /// Get the strategy timeout as a Duration
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version.is_empty() {
            return Err("model_version must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err("epsilon must be in [0, 1]".to_string());
        }
        if self.strategy_timeout_secs == 0 {
            return Err("strategy_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_version: "rules-v1".to_string(),
            // Keyword scores move in 0.05 steps; anything closer is a tie
            epsilon: 0.05,
            strategy_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_epsilon() {
        let mut config = EngineConfig::default();
        config.epsilon = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = EngineConfig::default();
        config.strategy_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_model_version() {
        let mut config = EngineConfig::default();
        config.model_version = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = EngineConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.model_version, parsed.model_version);
        assert_eq!(config.epsilon, parsed.epsilon);
        assert_eq!(config.strategy_timeout_secs, parsed.strategy_timeout_secs);
    }
}

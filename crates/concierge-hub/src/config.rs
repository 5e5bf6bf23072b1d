//! Hub configuration loaded from TOML

use concierge_engine::EngineConfig;
use concierge_feedback::FeedbackConfig;
use concierge_routing::RoutingConfig;
use serde::Deserialize;
use std::path::Path;

use crate::HubError;

/// Top-level hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// SQLite database path (`:memory:` for ephemeral runs)
    pub database_path: String,

    /// Egress retry attempts per instruction
    #[serde(default = "default_egress_max_attempts")]
    pub egress_max_attempts: u32,

    /// Base egress backoff delay in milliseconds (doubles per attempt)
    #[serde(default = "default_egress_base_delay_ms")]
    pub egress_base_delay_ms: u64,

    /// External model endpoint for ticket classification
    ///
    /// When set, ticket-type classification is delegated to this endpoint
    /// instead of the keyword tables; the other axes are unaffected.
    #[serde(default)]
    pub model_endpoint: Option<String>,

    /// Model identifier the endpoint understands
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Classifier engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Routing thresholds, destinations, and rules
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Feedback trailing-window settings
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

fn default_egress_max_attempts() -> u32 {
    3
}

fn default_egress_base_delay_ms() -> u64 {
    1000
}

fn default_model_name() -> String {
    "llama2".to_string()
}

impl HubConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, HubError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("Failed to read config file: {}", e)))?;
        let config: HubConfig = toml::from_str(&contents)
            .map_err(|e| HubError::Config(format!("Failed to parse config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all nested configuration
    pub fn validate(&self) -> Result<(), HubError> {
        if self.database_path.is_empty() {
            return Err(HubError::Config("database_path must not be empty".to_string()));
        }
        if self.egress_max_attempts == 0 {
            return Err(HubError::Config(
                "egress_max_attempts must be greater than 0".to_string(),
            ));
        }
        self.engine.validate().map_err(HubError::Config)?;
        self.routing.validate().map_err(HubError::Config)?;
        self.feedback.validate().map_err(HubError::Config)?;
        Ok(())
    }

    /// Create a default configuration for testing and demos
    pub fn default_test_config() -> Self {
        Self {
            database_path: ":memory:".to_string(),
            egress_max_attempts: 3,
            egress_base_delay_ms: 1000,
            model_endpoint: None,
            model_name: default_model_name(),
            engine: EngineConfig::default(),
            routing: RoutingConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

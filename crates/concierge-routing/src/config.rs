//! Routing configuration
//!
//! Every threshold, destination, and rule is loaded from configuration so
//! routing behavior is tunable without a code change.

use crate::rules::ForcedReviewRule;
use concierge_domain::{LabelCategory, TicketType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for the routing manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Minimum actor confidence for auto-routing
    pub actor_threshold: f64,

    /// Minimum ticket-type confidence for auto-routing
    pub ticket_threshold: f64,

    /// Minimum priority confidence for auto-routing
    pub priority_threshold: f64,

    /// Minimum spam confidence for outright rejection
    ///
    /// Typically higher than the other thresholds: suppressing a real
    /// customer is worse than reviewing a telemarketer.
    pub spam_threshold: f64,

    /// Name of the human review queue
    pub review_queue: String,

    /// Destination per ticket type (keyed by the label's canonical string)
    #[serde(default)]
    pub destinations: HashMap<String, String>,

    /// Destination when no ticket-type mapping exists
    pub default_destination: String,

    /// Rules that force manual review regardless of confidence
    #[serde(default)]
    pub forced_review_rules: Vec<ForcedReviewRule>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let mut destinations = HashMap::new();
        destinations.insert("cancellation".to_string(), "retention-queue".to_string());
        destinations.insert("refund".to_string(), "billing-queue".to_string());
        destinations.insert("account_payment".to_string(), "billing-queue".to_string());
        destinations.insert("promotional".to_string(), "marketing-queue".to_string());
        destinations.insert(
            "technical_support".to_string(),
            "support-queue".to_string(),
        );
        destinations.insert("spray_tan".to_string(), "services-queue".to_string());
        destinations.insert("review".to_string(), "reputation-queue".to_string());

        Self {
            actor_threshold: 0.85,
            ticket_threshold: 0.9,
            priority_threshold: 0.5,
            spam_threshold: 0.95,
            review_queue: "review".to_string(),
            destinations,
            default_destination: "front-desk".to_string(),
            forced_review_rules: vec![
                ForcedReviewRule::vip_franchisee(),
                ForcedReviewRule::escalation_language(),
            ],
        }
    }
}

impl RoutingConfig {
    /// Permissive preset: low thresholds, no forced-review rules
    pub fn permissive() -> Self {
        Self {
            actor_threshold: 0.5,
            ticket_threshold: 0.5,
            priority_threshold: 0.3,
            spam_threshold: 0.9,
            forced_review_rules: Vec::new(),
            ..Self::default()
        }
    }

    /// Strict preset: high thresholds, stock rules
    pub fn strict() -> Self {
        Self {
            actor_threshold: 0.92,
            ticket_threshold: 0.95,
            priority_threshold: 0.7,
            spam_threshold: 0.98,
            ..Self::default()
        }
    }

    /// Threshold for one category
    pub fn threshold(&self, category: LabelCategory) -> f64 {
        match category {
            LabelCategory::Actor => self.actor_threshold,
            LabelCategory::Ticket => self.ticket_threshold,
            LabelCategory::Priority => self.priority_threshold,
        }
    }

    /// Destination queue for a ticket type
    pub fn destination_for(&self, ticket_type: TicketType) -> &str {
        self.destinations
            .get(ticket_type.as_str())
            .unwrap_or(&self.default_destination)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("actor_threshold", self.actor_threshold),
            ("ticket_threshold", self.ticket_threshold),
            ("priority_threshold", self.priority_threshold),
            ("spam_threshold", self.spam_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1]", name));
            }
        }
        if self.review_queue.is_empty() {
            return Err("review_queue must not be empty".to_string());
        }
        if self.default_destination.is_empty() {
            return Err("default_destination must not be empty".to_string());
        }
        for rule in &self.forced_review_rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RoutingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(RoutingConfig::permissive().validate().is_ok());
        assert!(RoutingConfig::strict().validate().is_ok());
    }

    #[test]
    fn test_threshold_lookup() {
        let config = RoutingConfig::default();
        assert_eq!(config.threshold(LabelCategory::Actor), 0.85);
        assert_eq!(config.threshold(LabelCategory::Ticket), 0.9);
        assert_eq!(config.threshold(LabelCategory::Priority), 0.5);
    }

    #[test]
    fn test_destination_lookup() {
        let config = RoutingConfig::default();
        assert_eq!(config.destination_for(TicketType::Refund), "billing-queue");
        assert_eq!(config.destination_for(TicketType::Other), "front-desk");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = RoutingConfig::default();
        config.spam_threshold = 1.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RoutingConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = RoutingConfig::from_toml(&toml_str).unwrap();

        assert_eq!(parsed.actor_threshold, config.actor_threshold);
        assert_eq!(parsed.spam_threshold, config.spam_threshold);
        assert_eq!(parsed.forced_review_rules, config.forced_review_rules);
    }

    #[test]
    fn test_toml_with_custom_rule() {
        let toml_str = r#"
            actor_threshold = 0.8
            ticket_threshold = 0.85
            priority_threshold = 0.4
            spam_threshold = 0.97
            review_queue = "triage"
            default_destination = "front-desk"

            [[forced_review_rules]]
            name = "vip_franchisee"
            actor_is = "franchisee"
        "#;

        let config = RoutingConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.review_queue, "triage");
        assert_eq!(config.forced_review_rules.len(), 1);
        assert_eq!(config.forced_review_rules[0].name, "vip_franchisee");
    }
}

//! Forced-review business rules
//!
//! Data-driven predicates evaluated before any threshold check. A matching
//! rule sends the interaction to manual review regardless of how confident
//! the classifier was. Rules are plain configuration, so operations staff
//! can add or retire them without a deploy.

use concierge_domain::{ClassificationResult, Interaction};
use serde::{Deserialize, Serialize};

/// One forced-review rule
///
/// Every specified condition must hold for the rule to match; a rule with
/// no conditions is rejected by validation. The stock configuration ships
/// two: always review franchisee interactions, and always review anything
/// carrying escalation language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedReviewRule {
    /// Rule name, surfaced in the routing reason
    pub name: String,

    /// Match when the classified actor type equals this label
    #[serde(default)]
    pub actor_is: Option<String>,

    /// Match when any of these phrases occurs in the normalized text
    #[serde(default)]
    pub keyword_any: Vec<String>,
}

impl ForcedReviewRule {
    /// Whether this rule fires for the given interaction and classification
    pub fn matches(&self, interaction: &Interaction, classification: &ClassificationResult) -> bool {
        if let Some(actor) = &self.actor_is {
            if classification.actor_type.as_str() != actor.as_str() {
                return false;
            }
        }

        if !self.keyword_any.is_empty() {
            let text = interaction.normalized_text.as_str();
            if !self.keyword_any.iter().any(|cue| text.contains(cue.as_str())) {
                return false;
            }
        }

        self.actor_is.is_some() || !self.keyword_any.is_empty()
    }

    /// Validate that the rule can ever match
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("rule name must not be empty".to_string());
        }
        if self.actor_is.is_none() && self.keyword_any.is_empty() {
            return Err(format!("rule '{}' has no conditions", self.name));
        }
        Ok(())
    }

    /// Stock rule: franchisee interactions are always reviewed manually
    pub fn vip_franchisee() -> Self {
        Self {
            name: "vip_franchisee".to_string(),
            actor_is: Some("franchisee".to_string()),
            keyword_any: Vec::new(),
        }
    }

    /// Stock rule: escalation language is always reviewed manually
    pub fn escalation_language() -> Self {
        Self {
            name: "escalation_language".to_string(),
            actor_is: None,
            keyword_any: [
                "angry",
                "frustrated",
                "disappointed",
                "legal",
                "lawsuit",
                "complaint",
                "escalate",
                "manager",
                "unresolved",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::{
        ActorType, ClassificationId, Confidence, Priority, SourceChannel, TicketType,
    };

    fn interaction(text: &str) -> Interaction {
        Interaction::new(
            SourceChannel::Email,
            text.to_string(),
            text.to_string(),
            1_700_000_000,
            None,
        )
    }

    fn classification(interaction: &Interaction, actor: ActorType) -> ClassificationResult {
        ClassificationResult {
            id: ClassificationId::new(),
            interaction_id: interaction.id,
            seq: 0,
            actor_type: actor,
            actor_confidence: Confidence::new(0.95),
            ticket_type: TicketType::Other,
            ticket_confidence: Confidence::new(0.95),
            priority: Priority::Normal,
            priority_confidence: Confidence::new(0.9),
            model_version: "rules-v1".to_string(),
            classified_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_actor_rule_matches() {
        let rule = ForcedReviewRule::vip_franchisee();
        let subject = interaction("quick question about supplies");

        assert!(rule.matches(&subject, &classification(&subject, ActorType::Franchisee)));
        assert!(!rule.matches(&subject, &classification(&subject, ActorType::NewClient)));
    }

    #[test]
    fn test_keyword_rule_matches() {
        let rule = ForcedReviewRule::escalation_language();

        let heated = interaction("i am very angry and will take legal action");
        assert!(rule.matches(&heated, &classification(&heated, ActorType::ExistingMember)));

        let calm = interaction("please update my card on file");
        assert!(!rule.matches(&calm, &classification(&calm, ActorType::ExistingMember)));
    }

    #[test]
    fn test_combined_conditions_are_anded() {
        let rule = ForcedReviewRule {
            name: "upset_franchisee".to_string(),
            actor_is: Some("franchisee".to_string()),
            keyword_any: vec!["angry".to_string()],
        };

        let upset = interaction("i am angry about the royalty change");
        assert!(rule.matches(&upset, &classification(&upset, ActorType::Franchisee)));
        assert!(!rule.matches(&upset, &classification(&upset, ActorType::NewClient)));

        let calm = interaction("question about the royalty change");
        assert!(!rule.matches(&calm, &classification(&calm, ActorType::Franchisee)));
    }

    #[test]
    fn test_validate_rejects_empty_rule() {
        let rule = ForcedReviewRule {
            name: "noop".to_string(),
            actor_is: None,
            keyword_any: Vec::new(),
        };
        assert!(rule.validate().is_err());
        assert!(ForcedReviewRule::vip_franchisee().validate().is_ok());
    }
}

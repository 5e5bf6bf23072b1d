//! Routing decision logic

use crate::config::RoutingConfig;
use crate::error::RoutingError;
use concierge_domain::{
    ClassificationResult, Interaction, LabelCategory, OverrideRecord, ReviewState, RoutingAction,
    RoutingDecision, RoutingReason, TicketType,
};
use tracing::{debug, info};

/// The routing manager turns classifications into routing decisions
///
/// Holds only read-only configuration; concurrent decisions for different
/// interactions are safe. Serialization of decisions for one interaction is
/// the caller's job via `DecisionGuards`.
pub struct RoutingManager {
    config: RoutingConfig,
}

impl RoutingManager {
    /// Create a manager with the given configuration
    pub fn new(config: RoutingConfig) -> Result<Self, RoutingError> {
        config
            .validate()
            .map_err(RoutingError::Config)?;
        Ok(Self { config })
    }

    /// Create a manager with default configuration
    pub fn default_config() -> Self {
        Self {
            config: RoutingConfig::default(),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Decide what to do with a classified interaction
    ///
    /// Evaluation order: forced-review rules, then the spam threshold, then
    /// per-category confidence thresholds. A spam classification never
    /// auto-routes: it is either rejected (above the spam threshold) or
    /// reviewed (below it).
    pub fn decide(
        &self,
        interaction: &Interaction,
        classification: &ClassificationResult,
        decided_at: u64,
    ) -> RoutingDecision {
        let (action, reason) = self.evaluate(interaction, classification);

        info!(
            interaction_id = %interaction.id,
            action = ?action,
            "Routing decision made"
        );

        RoutingDecision {
            interaction_id: interaction.id,
            classification_id: classification.id,
            action,
            reason,
            decided_at,
        }
    }

    fn evaluate(
        &self,
        interaction: &Interaction,
        classification: &ClassificationResult,
    ) -> (RoutingAction, RoutingReason) {
        // 1. Business rules outrank everything, including confidence
        for rule in &self.config.forced_review_rules {
            if rule.matches(interaction, classification) {
                debug!(rule = %rule.name, "Forced-review rule matched");
                return (
                    RoutingAction::QueueForReview,
                    RoutingReason::RuleForcedReview {
                        rule: rule.name.clone(),
                    },
                );
            }
        }

        // 2. Spam threshold
        if classification.ticket_type == TicketType::Spam {
            if classification
                .ticket_confidence
                .meets(self.config.spam_threshold)
            {
                return (
                    RoutingAction::RejectAsSpam,
                    RoutingReason::SpamThresholdMet {
                        confidence: classification.ticket_confidence,
                    },
                );
            }
            // Suspected spam without enough confidence goes to a human
            return (
                RoutingAction::QueueForReview,
                RoutingReason::BelowThreshold {
                    category: LabelCategory::Ticket,
                    confidence: classification.ticket_confidence,
                    threshold: self.config.spam_threshold,
                },
            );
        }

        // 3. Per-category thresholds
        for category in LabelCategory::all() {
            let confidence = classification.confidence(*category);
            let threshold = self.config.threshold(*category);
            if !confidence.meets(threshold) {
                return (
                    RoutingAction::QueueForReview,
                    RoutingReason::BelowThreshold {
                        category: *category,
                        confidence,
                        threshold,
                    },
                );
            }
        }

        // 4. Confident on every axis, no rule objection
        (
            RoutingAction::AutoRoute {
                destination: self
                    .config
                    .destination_for(classification.ticket_type)
                    .to_string(),
            },
            RoutingReason::AllThresholdsMet,
        )
    }

    /// The review state a routing action settles the interaction into
    pub fn target_state(action: &RoutingAction) -> ReviewState {
        match action {
            RoutingAction::AutoRoute { .. } => ReviewState::AutoRouted,
            RoutingAction::QueueForReview => ReviewState::UnderReview,
            RoutingAction::RejectAsSpam => ReviewState::RejectedSpam,
        }
    }

    /// Validate an operator override against the classification it targets
    ///
    /// An override referencing a nonexistent classification, or one that
    /// belongs to a different interaction, is rejected — logged by the
    /// caller, never applied.
    pub fn validate_override(
        &self,
        classification: Option<&ClassificationResult>,
        record: &OverrideRecord,
    ) -> Result<(), RoutingError> {
        let classification = classification.ok_or_else(|| {
            RoutingError::InvalidOverride(format!(
                "classification {} does not exist",
                record.original_classification_id
            ))
        })?;

        if classification.id != record.original_classification_id {
            return Err(RoutingError::InvalidOverride(format!(
                "classification id mismatch: {} vs {}",
                classification.id, record.original_classification_id
            )));
        }

        if classification.interaction_id != record.interaction_id {
            return Err(RoutingError::InvalidOverride(format!(
                "classification {} belongs to interaction {}, not {}",
                classification.id, classification.interaction_id, record.interaction_id
            )));
        }

        Ok(())
    }
}

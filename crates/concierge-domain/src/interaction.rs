//! Interaction module - the canonical unit of work

use crate::{ActorType, InteractionId, SourceChannel};

/// One customer-service contact event, normalized to canonical form
///
/// Created by the normalizer on ingestion and never mutated afterwards.
/// Annotations (classifications, decisions, overrides) attach through
/// separate entities that reference the interaction by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// Unique identifier, assigned at ingestion
    pub id: InteractionId,

    /// Channel the interaction arrived through
    pub source_channel: SourceChannel,

    /// Opaque source-specific content, immutable once stored
    pub raw_payload: String,

    /// Derived plain-text content used for classification; computed once
    pub normalized_text: String,

    /// When the interaction was received (seconds since Unix epoch)
    pub received_at: u64,

    /// Pre-known actor classification, used as a classifier prior
    pub actor_hint: Option<ActorType>,

    /// Whether normalization yielded no usable text
    ///
    /// Flagged interactions are persisted and routed to review, never
    /// silently dropped.
    pub empty_content: bool,
}

impl Interaction {
    /// Create a new interaction with freshly derived normalized text
    pub fn new(
        source_channel: SourceChannel,
        raw_payload: String,
        normalized_text: String,
        received_at: u64,
        actor_hint: Option<ActorType>,
    ) -> Self {
        let empty_content = normalized_text.is_empty();
        Self {
            id: InteractionId::new(),
            source_channel,
            raw_payload,
            normalized_text,
            received_at,
            actor_hint,
            empty_content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_interaction_flags_empty_content() {
        let full = Interaction::new(
            SourceChannel::Email,
            "raw".to_string(),
            "hello".to_string(),
            1_700_000_000,
            None,
        );
        assert!(!full.empty_content);

        let empty = Interaction::new(
            SourceChannel::Email,
            "raw".to_string(),
            String::new(),
            1_700_000_000,
            None,
        );
        assert!(empty.empty_content);
    }

    #[test]
    fn test_actor_hint_is_preserved() {
        let interaction = Interaction::new(
            SourceChannel::Ticket,
            "raw".to_string(),
            "text".to_string(),
            1_700_000_000,
            Some(ActorType::Franchisee),
        );
        assert_eq!(interaction.actor_hint, Some(ActorType::Franchisee));
    }
}

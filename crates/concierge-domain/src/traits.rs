//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{
    ClassificationId, ClassificationResult, Interaction, InteractionId, LabelCategory,
    OverrideRecord, ReviewState, RoutingDecision, SourceChannel,
};

/// Trait for the append-only interaction store
///
/// Implemented by the infrastructure layer (concierge-store). Interactions
/// are written once at ingestion and never updated; only the review state
/// marker advances, through the state machine.
pub trait InteractionStore {
    /// Error type for store operations
    type Error;

    /// Persist a new interaction
    fn insert_interaction(&mut self, interaction: Interaction) -> Result<InteractionId, Self::Error>;

    /// Get an interaction by ID
    fn get_interaction(&self, id: InteractionId) -> Result<Option<Interaction>, Self::Error>;

    /// Look up an interaction previously delivered with this dedup key
    fn find_by_dedup_key(
        &self,
        channel: SourceChannel,
        dedup_key: &str,
    ) -> Result<Option<InteractionId>, Self::Error>;

    /// Remember a dedup key for an interaction
    fn record_dedup_key(
        &mut self,
        channel: SourceChannel,
        dedup_key: &str,
        id: InteractionId,
    ) -> Result<(), Self::Error>;

    /// Current review state of an interaction
    fn review_state(&self, id: InteractionId) -> Result<Option<ReviewState>, Self::Error>;

    /// Advance the review state; rejects illegal transitions
    fn set_review_state(&mut self, id: InteractionId, state: ReviewState)
        -> Result<(), Self::Error>;
}

/// Trait for the append-only classification history
///
/// Results are keyed by `interaction_id` + `seq`; the history for an
/// interaction never shrinks and is never reordered.
pub trait ClassificationLog {
    /// Error type for log operations
    type Error;

    /// Append a result; its `seq` must be the next in the history
    fn append_classification(
        &mut self,
        result: ClassificationResult,
    ) -> Result<ClassificationId, Self::Error>;

    /// Get one result by id
    fn get_classification(
        &self,
        id: ClassificationId,
    ) -> Result<Option<ClassificationResult>, Self::Error>;

    /// Full history for an interaction, ordered by `seq`
    fn classification_history(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<ClassificationResult>, Self::Error>;

    /// Next free sequence number for an interaction
    fn next_seq(&self, interaction_id: InteractionId) -> Result<u64, Self::Error>;
}

/// Trait for the append-only override log
pub trait OverrideLog {
    /// Error type for log operations
    type Error;

    /// Append an override record
    fn append_override(&mut self, record: OverrideRecord) -> Result<(), Self::Error>;

    /// All overrides for an interaction, oldest first
    fn overrides_for(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<OverrideRecord>, Self::Error>;
}

/// Trait for the routing decision log
pub trait DecisionLog {
    /// Error type for log operations
    type Error;

    /// Append a routing decision
    fn append_decision(&mut self, decision: RoutingDecision) -> Result<(), Self::Error>;

    /// All decisions for an interaction, oldest first
    fn decisions_for(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<RoutingDecision>, Self::Error>;
}

/// Read path into historical label precision
///
/// Implemented by the feedback tracker (concierge-feedback). The classifier
/// engine consults it to break near-ties between labels; it must tolerate
/// concurrent readers while overrides are being appended.
pub trait PrecisionSource {
    /// Historical precision for a label within a category, if any history exists
    fn precision(&self, category: LabelCategory, label: &str) -> Option<f64>;
}

/// Trait for external classification model calls
///
/// Implemented by the infrastructure layer (concierge-llm). The engine is
/// agnostic to which underlying model or vendor answers; callers bound the
/// call with a timeout and treat failure as "no signal" from that strategy.
pub trait ModelProvider {
    /// Error type for model operations
    type Error;

    /// Generate a completion for a classification prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;
}

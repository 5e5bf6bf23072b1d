//! Classification result module - labeled output of the classifier engine

use crate::{
    ActorType, ClassificationId, Confidence, InteractionId, LabelCategory, Priority, TicketType,
};

/// Labels and per-label confidence for one classifier invocation
///
/// Produced exactly once per invocation; re-classification appends a new
/// result with the next `seq`, never overwrites. The results for an
/// interaction form an append-only ordered history.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Unique identifier
    pub id: ClassificationId,

    /// Interaction this result labels (non-owning reference)
    pub interaction_id: InteractionId,

    /// Position in the per-interaction classification history, from 0
    pub seq: u64,

    /// Assigned actor label
    pub actor_type: ActorType,

    /// Confidence in the actor label
    pub actor_confidence: Confidence,

    /// Assigned ticket type label
    pub ticket_type: TicketType,

    /// Confidence in the ticket type label
    pub ticket_confidence: Confidence,

    /// Assigned priority
    pub priority: Priority,

    /// Confidence in the priority
    pub priority_confidence: Confidence,

    /// Identifier of the classifier logic/version that produced this result
    ///
    /// Required for auditability: the same interaction classified by the
    /// same version must yield an equivalent result.
    pub model_version: String,

    /// When classification occurred (seconds since Unix epoch)
    pub classified_at: u64,
}

impl ClassificationResult {
    /// Confidence for one category
    pub fn confidence(&self, category: LabelCategory) -> Confidence {
        match category {
            LabelCategory::Actor => self.actor_confidence,
            LabelCategory::Ticket => self.ticket_confidence,
            LabelCategory::Priority => self.priority_confidence,
        }
    }

    /// The assigned label for one category, as its canonical string
    pub fn label(&self, category: LabelCategory) -> &'static str {
        match category {
            LabelCategory::Actor => self.actor_type.as_str(),
            LabelCategory::Ticket => self.ticket_type.as_str(),
            LabelCategory::Priority => self.priority.as_str(),
        }
    }
}

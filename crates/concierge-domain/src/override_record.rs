//! Override record module - human corrections to classifier output

use crate::{ActorType, ClassificationId, InteractionId, Priority, TicketType};

/// A human correction to a machine-produced classification
///
/// Additive evidence: an override never deletes or edits the original
/// classification result. Any subset of the three labels may be corrected;
/// a record with no corrections at all is an explicit confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRecord {
    /// Interaction being corrected
    pub interaction_id: InteractionId,

    /// Classification the operator reviewed
    pub original_classification_id: ClassificationId,

    /// Corrected actor label, if the operator changed it
    pub corrected_actor_type: Option<ActorType>,

    /// Corrected ticket type, if the operator changed it
    pub corrected_ticket_type: Option<TicketType>,

    /// Corrected priority, if the operator changed it
    pub corrected_priority: Option<Priority>,

    /// Operator who submitted the correction
    pub operator_id: String,

    /// When the correction was submitted (seconds since Unix epoch)
    pub corrected_at: u64,
}

impl OverrideRecord {
    /// Whether the operator changed anything at all
    ///
    /// A record that corrects nothing is an explicit confirmation — the
    /// operator looked and agreed. The feedback tracker counts it as
    /// correct but audits it separately from implicit confirmation.
    pub fn is_confirmation(&self) -> bool {
        self.corrected_actor_type.is_none()
            && self.corrected_ticket_type.is_none()
            && self.corrected_priority.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_detection() {
        let confirm = OverrideRecord {
            interaction_id: InteractionId::new(),
            original_classification_id: ClassificationId::new(),
            corrected_actor_type: None,
            corrected_ticket_type: None,
            corrected_priority: None,
            operator_id: "op-7".to_string(),
            corrected_at: 1_700_000_000,
        };
        assert!(confirm.is_confirmation());

        let correction = OverrideRecord {
            corrected_ticket_type: Some(TicketType::Cancellation),
            ..confirm.clone()
        };
        assert!(!correction.is_confirmation());
    }
}

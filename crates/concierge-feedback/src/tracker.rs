//! Feedback tracking and accuracy recomputation

use concierge_domain::traits::PrecisionSource;
use concierge_domain::{
    ClassificationResult, InteractionId, LabelCategory, OverrideRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Configuration for the feedback tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Number of most-recently resolved interactions that accuracy and
    /// precision are computed over
    pub window_size: usize,
}

impl FeedbackConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("window_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { window_size: 500 }
    }
}

/// One recorded event: a resolution with or without an override
///
/// Events are appended and never edited; every metric is derived from this
/// log at read time.
#[derive(Debug, Clone)]
enum FeedbackEvent {
    /// Interaction resolved with no override (implicit confirmation)
    Resolved { result: ClassificationResult },

    /// Operator submitted an override against the classification
    Overridden {
        result: ClassificationResult,
        record: OverrideRecord,
    },
}

impl FeedbackEvent {
    fn interaction_id(&self) -> InteractionId {
        match self {
            FeedbackEvent::Resolved { result } => result.interaction_id,
            FeedbackEvent::Overridden { result, .. } => result.interaction_id,
        }
    }
}

/// Audit counters distinguishing how classifications were confirmed
///
/// "No override occurred" and "override occurred but matched the original"
/// both count as correct for accuracy math, but auditors need to tell them
/// apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditCounters {
    /// Resolutions with no override at all
    pub implicit_confirmations: usize,

    /// Overrides that changed nothing
    pub explicit_confirmations: usize,

    /// Overrides that corrected at least one label
    pub corrections: usize,
}

/// Per-interaction verdict derived from the event log
#[derive(Debug, Clone)]
struct Verdict {
    result: ClassificationResult,
    effective_actor: &'static str,
    effective_ticket: &'static str,
    effective_priority: &'static str,
}

impl Verdict {
    fn assigned(&self, category: LabelCategory) -> &'static str {
        self.result.label(category)
    }

    fn effective(&self, category: LabelCategory) -> &'static str {
        match category {
            LabelCategory::Actor => self.effective_actor,
            LabelCategory::Ticket => self.effective_ticket,
            LabelCategory::Priority => self.effective_priority,
        }
    }

    fn correct(&self, category: LabelCategory) -> bool {
        self.assigned(category) == self.effective(category)
    }
}

/// The feedback loop tracker
///
/// Single-writer/multi-reader: `record_*` methods take the write lock
/// briefly to append; `accuracy`, `precision_by_label`, and the
/// `PrecisionSource` read path recompute under the read lock.
#[derive(Debug, Default)]
pub struct FeedbackTracker {
    config: FeedbackConfig,
    events: RwLock<Vec<FeedbackEvent>>,
}

impl FeedbackTracker {
    /// Create a tracker with the given configuration
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            events: RwLock::new(Vec::new()),
        }
    }

    /// Record a resolution with no override (implicit confirmation)
    pub fn record_resolution(&self, result: ClassificationResult) {
        debug!(interaction_id = %result.interaction_id, "Recording implicit confirmation");
        self.events
            .write()
            .expect("feedback log lock poisoned")
            .push(FeedbackEvent::Resolved { result });
    }

    /// Record an operator override against a classification
    pub fn record_override(&self, result: ClassificationResult, record: OverrideRecord) {
        debug!(
            interaction_id = %record.interaction_id,
            operator = %record.operator_id,
            confirmation = record.is_confirmation(),
            "Recording override"
        );
        self.events
            .write()
            .expect("feedback log lock poisoned")
            .push(FeedbackEvent::Overridden { result, record });
    }

    /// Accuracy for a category over the trailing window
    ///
    /// Fraction of resolved interactions whose label for the category was
    /// not altered by any override. Returns 1.0 for an empty window — no
    /// evidence of error is not evidence of error.
    pub fn accuracy(&self, category: LabelCategory) -> f64 {
        let verdicts = self.window_verdicts();
        if verdicts.is_empty() {
            return 1.0;
        }

        let correct = verdicts.iter().filter(|v| v.correct(category)).count();
        correct as f64 / verdicts.len() as f64
    }

    /// Precision for one label within a category over the trailing window
    ///
    /// Of the interactions the classifier assigned this label, the fraction
    /// where no override changed it. Returns `None` when the window holds no
    /// interaction with that assigned label.
    pub fn precision_by_label(&self, category: LabelCategory, label: &str) -> Option<f64> {
        let verdicts = self.window_verdicts();
        let assigned: Vec<&Verdict> = verdicts
            .iter()
            .filter(|v| v.assigned(category) == label)
            .collect();

        if assigned.is_empty() {
            return None;
        }

        let correct = assigned.iter().filter(|v| v.correct(category)).count();
        Some(correct as f64 / assigned.len() as f64)
    }

    /// Audit counters over the trailing window
    pub fn audit_counters(&self) -> AuditCounters {
        let events = self.events.read().expect("feedback log lock poisoned");
        let window_ids = Self::window_interaction_ids(&events, self.config.window_size);

        let mut counters = AuditCounters::default();
        let mut overridden: HashMap<InteractionId, bool> = HashMap::new();

        // Every override event stays in the audit trail, even when a later
        // override supersedes it for accuracy purposes
        for event in events.iter() {
            let id = event.interaction_id();
            if !window_ids.contains_key(&id) {
                continue;
            }
            match event {
                FeedbackEvent::Resolved { .. } => {
                    overridden.entry(id).or_insert(false);
                }
                FeedbackEvent::Overridden { record, .. } => {
                    // A pure-confirmation override still counts as explicit
                    let changed = !record.is_confirmation();
                    overridden.insert(id, true);
                    if changed {
                        counters.corrections += 1;
                    } else {
                        counters.explicit_confirmations += 1;
                    }
                }
            }
        }

        counters.implicit_confirmations = overridden.values().filter(|v| !**v).count();
        counters
    }

    /// Number of distinct interactions currently contributing to metrics
    pub fn window_len(&self) -> usize {
        self.window_verdicts().len()
    }

    /// Generate a summary report of the current metrics
    pub fn summary(&self) -> String {
        let counters = self.audit_counters();
        let mut lines = vec![
            "Feedback Tracker Summary".to_string(),
            "========================".to_string(),
            format!("Window: {} interactions", self.window_len()),
            String::new(),
        ];

        for category in LabelCategory::all() {
            lines.push(format!(
                "Accuracy ({}): {:.3}",
                category.as_str(),
                self.accuracy(*category)
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Implicit confirmations: {}",
            counters.implicit_confirmations
        ));
        lines.push(format!(
            "Explicit confirmations: {}",
            counters.explicit_confirmations
        ));
        lines.push(format!("Corrections: {}", counters.corrections));

        lines.join("\n")
    }

    /// Derive per-interaction verdicts for the trailing window
    ///
    /// The latest classification per interaction is the assignment; override
    /// events apply in log order, so the latest override is authoritative
    /// while earlier ones remain in the log.
    fn window_verdicts(&self) -> Vec<Verdict> {
        let events = self.events.read().expect("feedback log lock poisoned");
        let window_ids = Self::window_interaction_ids(&events, self.config.window_size);

        let mut verdicts: HashMap<InteractionId, Verdict> = HashMap::new();

        for event in events.iter() {
            let id = event.interaction_id();
            if !window_ids.contains_key(&id) {
                continue;
            }
            match event {
                FeedbackEvent::Resolved { result } => {
                    let verdict = verdicts.entry(id).or_insert_with(|| Verdict {
                        result: result.clone(),
                        effective_actor: result.actor_type.as_str(),
                        effective_ticket: result.ticket_type.as_str(),
                        effective_priority: result.priority.as_str(),
                    });
                    verdict.result = result.clone();
                }
                FeedbackEvent::Overridden { result, record } => {
                    let verdict = verdicts.entry(id).or_insert_with(|| Verdict {
                        result: result.clone(),
                        effective_actor: result.actor_type.as_str(),
                        effective_ticket: result.ticket_type.as_str(),
                        effective_priority: result.priority.as_str(),
                    });
                    if let Some(actor) = record.corrected_actor_type {
                        verdict.effective_actor = actor.as_str();
                    }
                    if let Some(ticket) = record.corrected_ticket_type {
                        verdict.effective_ticket = ticket.as_str();
                    }
                    if let Some(priority) = record.corrected_priority {
                        verdict.effective_priority = priority.as_str();
                    }
                }
            }
        }

        let mut ordered: Vec<(usize, Verdict)> = verdicts
            .into_iter()
            .map(|(id, verdict)| (window_ids[&id], verdict))
            .collect();
        ordered.sort_by_key(|(order, _)| *order);
        ordered.into_iter().map(|(_, verdict)| verdict).collect()
    }

    /// The most recent `window_size` distinct interactions, mapped to their
    /// first-seen order in the log
    fn window_interaction_ids(
        events: &[FeedbackEvent],
        window_size: usize,
    ) -> HashMap<InteractionId, usize> {
        let mut first_seen: Vec<InteractionId> = Vec::new();
        for event in events {
            let id = event.interaction_id();
            if !first_seen.contains(&id) {
                first_seen.push(id);
            }
        }

        let skip = first_seen.len().saturating_sub(window_size);
        first_seen
            .into_iter()
            .skip(skip)
            .enumerate()
            .map(|(order, id)| (id, order))
            .collect()
    }
}

impl PrecisionSource for FeedbackTracker {
    fn precision(&self, category: LabelCategory, label: &str) -> Option<f64> {
        self.precision_by_label(category, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::{
        ActorType, ClassificationId, Confidence, Priority, TicketType,
    };

    fn classification(ticket: TicketType) -> ClassificationResult {
        ClassificationResult {
            id: ClassificationId::new(),
            interaction_id: InteractionId::new(),
            seq: 0,
            actor_type: ActorType::ExistingMember,
            actor_confidence: Confidence::new(0.9),
            ticket_type: ticket,
            ticket_confidence: Confidence::new(0.85),
            priority: Priority::Normal,
            priority_confidence: Confidence::new(0.7),
            model_version: "rules-v1".to_string(),
            classified_at: 1_700_000_000,
        }
    }

    fn override_for(
        result: &ClassificationResult,
        ticket: Option<TicketType>,
    ) -> OverrideRecord {
        OverrideRecord {
            interaction_id: result.interaction_id,
            original_classification_id: result.id,
            corrected_actor_type: None,
            corrected_ticket_type: ticket,
            corrected_priority: None,
            operator_id: "op-1".to_string(),
            corrected_at: 1_700_000_100,
        }
    }

    #[test]
    fn test_empty_window_accuracy() {
        let tracker = FeedbackTracker::default();
        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 1.0);
        assert_eq!(
            tracker.precision_by_label(LabelCategory::Ticket, "refund"),
            None
        );
    }

    #[test]
    fn test_implicit_confirmations_count_as_correct() {
        let tracker = FeedbackTracker::default();
        tracker.record_resolution(classification(TicketType::Refund));
        tracker.record_resolution(classification(TicketType::Cancellation));

        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 1.0);
        assert_eq!(
            tracker.precision_by_label(LabelCategory::Ticket, "refund"),
            Some(1.0)
        );
    }

    #[test]
    fn test_correction_lowers_accuracy() {
        let tracker = FeedbackTracker::default();

        let kept = classification(TicketType::Refund);
        tracker.record_resolution(kept);

        let corrected = classification(TicketType::Refund);
        let record = override_for(&corrected, Some(TicketType::Cancellation));
        tracker.record_override(corrected, record);

        // One of two window entries was corrected on the ticket axis
        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 0.5);
        // The other axes were untouched by the override
        assert_eq!(tracker.accuracy(LabelCategory::Actor), 1.0);
        assert_eq!(tracker.accuracy(LabelCategory::Priority), 1.0);
    }

    #[test]
    fn test_explicit_confirmation_counts_as_correct_but_audits_separately() {
        let tracker = FeedbackTracker::default();

        let confirmed = classification(TicketType::Refund);
        let record = override_for(&confirmed, None);
        tracker.record_override(confirmed, record);

        tracker.record_resolution(classification(TicketType::Refund));

        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 1.0);

        let counters = tracker.audit_counters();
        assert_eq!(counters.explicit_confirmations, 1);
        assert_eq!(counters.implicit_confirmations, 1);
        assert_eq!(counters.corrections, 0);
    }

    #[test]
    fn test_latest_override_is_authoritative() {
        let tracker = FeedbackTracker::default();

        let result = classification(TicketType::Refund);
        let first = override_for(&result, Some(TicketType::Cancellation));
        let mut second = override_for(&result, Some(TicketType::Refund));
        second.operator_id = "op-2".to_string();

        tracker.record_override(result.clone(), first);
        tracker.record_override(result, second);

        // The second operator put the label back; the verdict is correct
        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 1.0);
        // Both override events remain counted in the audit trail
        let counters = tracker.audit_counters();
        assert_eq!(counters.corrections, 2);
    }

    #[test]
    fn test_precision_by_label_tracks_per_label() {
        let tracker = FeedbackTracker::default();

        // Two refund assignments, one corrected away
        tracker.record_resolution(classification(TicketType::Refund));
        let corrected = classification(TicketType::Refund);
        let record = override_for(&corrected, Some(TicketType::Cancellation));
        tracker.record_override(corrected, record);

        // One cancellation assignment, confirmed
        tracker.record_resolution(classification(TicketType::Cancellation));

        assert_eq!(
            tracker.precision_by_label(LabelCategory::Ticket, "refund"),
            Some(0.5)
        );
        assert_eq!(
            tracker.precision_by_label(LabelCategory::Ticket, "cancellation"),
            Some(1.0)
        );
        assert_eq!(
            tracker.precision_by_label(LabelCategory::Ticket, "spam"),
            None
        );
    }

    #[test]
    fn test_trailing_window_drops_oldest() {
        let tracker = FeedbackTracker::new(FeedbackConfig { window_size: 2 });

        // Oldest entry is a correction; it will fall out of the window
        let corrected = classification(TicketType::Refund);
        let record = override_for(&corrected, Some(TicketType::Cancellation));
        tracker.record_override(corrected, record);
        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 0.0);

        tracker.record_resolution(classification(TicketType::Refund));
        tracker.record_resolution(classification(TicketType::Refund));

        assert_eq!(tracker.window_len(), 2);
        assert_eq!(tracker.accuracy(LabelCategory::Ticket), 1.0);
    }

    #[test]
    fn test_accuracy_recomputation_is_deterministic() {
        let tracker = FeedbackTracker::default();

        tracker.record_resolution(classification(TicketType::Refund));
        let corrected = classification(TicketType::Spam);
        let record = override_for(&corrected, Some(TicketType::Promotional));
        tracker.record_override(corrected, record);

        let first = tracker.accuracy(LabelCategory::Ticket);
        let second = tracker.accuracy(LabelCategory::Ticket);
        let third = tracker.accuracy(LabelCategory::Ticket);

        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_precision_source_read_path() {
        let tracker = FeedbackTracker::default();
        tracker.record_resolution(classification(TicketType::Refund));

        let source: &dyn PrecisionSource = &tracker;
        assert_eq!(source.precision(LabelCategory::Ticket, "refund"), Some(1.0));
    }

    #[test]
    fn test_summary_report() {
        let tracker = FeedbackTracker::default();
        tracker.record_resolution(classification(TicketType::Refund));

        let summary = tracker.summary();
        assert!(summary.contains("Window: 1 interactions"));
        assert!(summary.contains("Accuracy (ticket): 1.000"));
        assert!(summary.contains("Implicit confirmations: 1"));
    }
}

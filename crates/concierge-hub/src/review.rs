//! Human review queue

use concierge_domain::{InteractionId, RoutingReason};
use std::sync::Mutex;

/// One interaction awaiting an operator
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    /// Interaction to review
    pub interaction_id: InteractionId,

    /// Queue the interaction was enqueued to
    pub queue: String,

    /// Why it needs a human
    pub reason: RoutingReason,

    /// When it entered the queue (seconds since Unix epoch)
    pub enqueued_at: u64,
}

/// In-memory registry of interactions waiting for review
///
/// Operators list pending items, then either resolve (confirming the
/// classification) or submit an override through the pipeline; both remove
/// the item here.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    items: Mutex<Vec<ReviewItem>>,
}

impl ReviewQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interaction to the queue
    ///
    /// Re-enqueueing an interaction already present replaces its entry;
    /// an interaction is never waiting in two places at once.
    pub fn push(&self, item: ReviewItem) {
        let mut items = self.items.lock().expect("review queue lock poisoned");
        items.retain(|existing| existing.interaction_id != item.interaction_id);
        items.push(item);
    }

    /// Remove an interaction from the queue (operator picked it up)
    pub fn remove(&self, interaction_id: InteractionId) -> Option<ReviewItem> {
        let mut items = self.items.lock().expect("review queue lock poisoned");
        let position = items
            .iter()
            .position(|item| item.interaction_id == interaction_id)?;
        Some(items.remove(position))
    }

    /// Snapshot of pending items, oldest first
    pub fn pending(&self) -> Vec<ReviewItem> {
        self.items.lock().expect("review queue lock poisoned").clone()
    }

    /// Number of pending items
    pub fn len(&self) -> usize {
        self.items.lock().expect("review queue lock poisoned").len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

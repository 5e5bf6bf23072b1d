//! Per-interaction decision serialization

use concierge_domain::InteractionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of per-interaction decision locks
///
/// Routing decisions for a single interaction must be serialized: at most
/// one decision in flight, or duplicate egress instructions could be
/// emitted. Callers take the guard for the interaction, hold it across
/// decide-record-emit, and retire it once the interaction settles.
///
/// This is the only point in the pipeline requiring mutual exclusion;
/// different interactions proceed fully in parallel.
#[derive(Debug, Default)]
pub struct DecisionGuards {
    locks: Mutex<HashMap<InteractionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DecisionGuards {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for an interaction
    pub fn guard(&self, id: InteractionId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("guard registry lock poisoned");
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drop the lock entry for a settled interaction
    ///
    /// Safe to call while another task still holds a clone of the Arc; the
    /// lock itself lives until the last clone is dropped.
    pub fn retire(&self, id: InteractionId) {
        let mut locks = self.locks.lock().expect("guard registry lock poisoned");
        locks.remove(&id);
    }

    /// Number of interactions currently tracked
    pub fn len(&self) -> usize {
        self.locks.lock().expect("guard registry lock poisoned").len()
    }

    /// Whether no interaction is currently tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

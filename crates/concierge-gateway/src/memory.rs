//! In-memory reference gateway
//!
//! Records every egress instruction instead of sending it anywhere. Used by
//! tests and the demo binary; also the template for writing a real adapter.

use crate::{AlertSink, EgressPort, RoutingMetadata};
use concierge_domain::InteractionId;
use std::sync::{Arc, Mutex};

/// One recorded egress instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EgressInstruction {
    /// A routed interaction and its destination
    Route {
        /// Interaction that was routed
        interaction_id: InteractionId,
        /// Destination queue/project
        destination: String,
        /// Labels attached for the destination system
        metadata: RoutingMetadata,
    },

    /// A spam suppression
    Suppress {
        /// Interaction that was suppressed
        interaction_id: InteractionId,
    },

    /// A review enqueue
    EnqueueReview {
        /// Interaction sent to review
        interaction_id: InteractionId,
        /// Review queue name
        queue: String,
    },
}

/// Recording in-memory gateway adapter
///
/// Clones share their recording, so a test can keep one handle while the
/// pipeline owns another. Transient failures can be injected to exercise
/// the retry wrapper.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    instructions: Arc<Mutex<Vec<EgressInstruction>>>,
    failures_remaining: Arc<Mutex<u32>>,
}

impl MemoryGateway {
    /// Create an empty gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` egress calls fail with a transient error
    pub fn fail_next(&self, count: u32) {
        *self.failures_remaining.lock().unwrap() = count;
    }

    /// All recorded instructions, in emission order
    pub fn instructions(&self) -> Vec<EgressInstruction> {
        self.instructions.lock().unwrap().clone()
    }

    /// Recorded instructions for one interaction
    pub fn instructions_for(&self, id: InteractionId) -> Vec<EgressInstruction> {
        self.instructions()
            .into_iter()
            .filter(|instruction| match instruction {
                EgressInstruction::Route { interaction_id, .. } => *interaction_id == id,
                EgressInstruction::Suppress { interaction_id } => *interaction_id == id,
                EgressInstruction::EnqueueReview { interaction_id, .. } => *interaction_id == id,
            })
            .collect()
    }

    fn check_failure(&self) -> Result<(), String> {
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err("injected transient failure".to_string());
        }
        Ok(())
    }
}

impl EgressPort for MemoryGateway {
    type Error = String;

    fn route(
        &self,
        interaction_id: InteractionId,
        destination: &str,
        metadata: &RoutingMetadata,
    ) -> Result<(), Self::Error> {
        self.check_failure()?;
        self.instructions
            .lock()
            .unwrap()
            .push(EgressInstruction::Route {
                interaction_id,
                destination: destination.to_string(),
                metadata: metadata.clone(),
            });
        Ok(())
    }

    fn suppress(&self, interaction_id: InteractionId) -> Result<(), Self::Error> {
        self.check_failure()?;
        self.instructions
            .lock()
            .unwrap()
            .push(EgressInstruction::Suppress { interaction_id });
        Ok(())
    }

    fn enqueue_review(
        &self,
        interaction_id: InteractionId,
        queue: &str,
    ) -> Result<(), Self::Error> {
        self.check_failure()?;
        self.instructions
            .lock()
            .unwrap()
            .push(EgressInstruction::EnqueueReview {
                interaction_id,
                queue: queue.to_string(),
            });
        Ok(())
    }
}

/// Recording alert sink for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertSink {
    alerts: Arc<Mutex<Vec<String>>>,
}

impl MemoryAlertSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All raised alerts, in order
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for MemoryAlertSink {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

//! Concierge Integration Gateway
//!
//! The abstract boundary through which normalized interactions arrive and
//! routed results depart. Concrete vendor integrations (help-desk, project
//! tracker, telephony, file storage) each implement the port traits here as
//! a separate adapter; new channels require only a new adapter, never core
//! changes.
//!
//! Egress is push, fire-and-forget with retry: transient failures back off
//! exponentially, and permanent failure raises an operational alert — it is
//! never silently dropped.

#![warn(missing_docs)]

pub mod memory;
pub mod retry;

use concierge_domain::InteractionId;
use thiserror::Error;

pub use memory::{EgressInstruction, MemoryAlertSink, MemoryGateway};
pub use retry::RetryingEgress;

/// Errors that can occur at the gateway boundary
#[derive(Error, Debug)]
pub enum GatewayError {
    /// An egress call failed after exhausting its retries
    ///
    /// Surfaced to the operator alert channel by the retry wrapper.
    #[error("Egress failure in {operation} after {attempts} attempts: {detail}")]
    EgressFailure {
        /// Which egress operation failed
        operation: &'static str,
        /// How many attempts were made
        attempts: u32,
        /// Last underlying error
        detail: String,
    },
}

/// Labels attached to a routed interaction for the destination system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingMetadata {
    /// Canonical ticket-type label
    pub ticket_type: String,

    /// Canonical actor-type label
    pub actor_type: String,

    /// Canonical priority label
    pub priority: String,
}

/// Outbound port: routed results departing to external systems
///
/// Implementations perform their own transport (HTTP, queue, RPC) and may
/// block; callers wrap them in `RetryingEgress`, which moves calls onto the
/// blocking pool and retries transient failures.
pub trait EgressPort {
    /// Error type for egress operations
    type Error: std::fmt::Display;

    /// Deliver a routed interaction to its destination queue/project
    fn route(
        &self,
        interaction_id: InteractionId,
        destination: &str,
        metadata: &RoutingMetadata,
    ) -> Result<(), Self::Error>;

    /// Suppress/archive an interaction rejected as spam
    fn suppress(&self, interaction_id: InteractionId) -> Result<(), Self::Error>;

    /// Enqueue an interaction for human review
    fn enqueue_review(
        &self,
        interaction_id: InteractionId,
        queue: &str,
    ) -> Result<(), Self::Error>;
}

/// Operational alert channel for permanent egress failures
pub trait AlertSink {
    /// Raise an operational alert
    fn alert(&self, message: &str);
}

/// Alert sink that emits through the tracing error channel
#[derive(Debug, Clone, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, message: &str) {
        tracing::error!(alert = true, "{}", message);
    }
}

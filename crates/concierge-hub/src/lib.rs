//! Concierge Hub
//!
//! Wires the full interaction pipeline together: gateway ingress with dedup,
//! normalization, classification, thresholded routing, egress with retry,
//! the human review queue, and the feedback loop.
//!
//! Control flow per interaction:
//!
//! ```text
//! deliver -> normalize -> classify -> decide -> egress
//!                |            |          |
//!          EmptyContent   Unavailable  review queue / suppress
//!                └────────────┴──> UnderReview (never dropped)
//! ```
//!
//! Interactions from independent sources process concurrently; within one
//! interaction the stages are strictly sequential, and the routing decision
//! is serialized so duplicate egress instructions cannot be emitted.

#![warn(missing_docs)]

pub mod config;
pub mod pipeline;
pub mod review;
pub mod worker;

use thiserror::Error;

pub use config::HubConfig;
pub use pipeline::{Disposition, Pipeline, ProcessOutcome};
pub use review::{ReviewItem, ReviewQueue};
pub use worker::Delivery;

/// Errors surfaced by the hub pipeline
///
/// Recoverable classification and normalization failures are not here: they
/// degrade the interaction to review inside the pipeline. Only boundary
/// errors become operator-visible.
#[derive(Error, Debug)]
pub enum HubError {
    /// The delivery named a channel the hub does not recognize
    #[error("Unsupported channel: {0}")]
    UnsupportedChannel(String),

    /// Storage failure
    #[error("Store error: {0}")]
    Store(String),

    /// Egress failed after exhausted retries (already alerted)
    #[error(transparent)]
    Egress(#[from] concierge_gateway::GatewayError),

    /// Operator override referenced a nonexistent or foreign classification
    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

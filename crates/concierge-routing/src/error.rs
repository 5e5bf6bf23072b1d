//! Routing manager error types

use concierge_domain::ReviewState;
use thiserror::Error;

/// Errors that can occur during routing and override handling
#[derive(Error, Debug)]
pub enum RoutingError {
    /// Operator-submitted override references a nonexistent classification
    /// or one belonging to a different interaction
    ///
    /// Rejected and logged, never applied.
    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    /// The requested state change is not legal for the interaction
    #[error("Illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: ReviewState,
        /// Rejected target state
        to: ReviewState,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

//! Sub-classifier strategy traits
//!
//! Each classification axis is an independent capability: any one strategy
//! can be swapped (rule-based, statistical, model-delegated) without
//! affecting the others. A strategy scores candidate labels; the engine
//! selects among them, so near-ties can be broken centrally against
//! historical precision.

use concierge_domain::{ActorType, Confidence, Interaction, Priority, TicketType};
use thiserror::Error;

/// Errors a strategy can raise
///
/// A failed strategy contributes "no signal" for its category; it does not
/// abort the other strategies.
#[derive(Error, Debug, Clone)]
pub enum StrategyError {
    /// The strategy's backing service could not be reached
    #[error("Strategy unavailable: {0}")]
    Unavailable(String),

    /// The strategy produced output that could not be interpreted
    #[error("Invalid strategy output: {0}")]
    InvalidOutput(String),
}

/// Scores candidate actor labels for an interaction
pub trait ActorClassifier {
    /// Score candidate labels; an empty result means no signal
    fn score(&self, interaction: &Interaction) -> Result<Vec<(ActorType, Confidence)>, StrategyError>;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Scores candidate ticket-type labels for an interaction
pub trait TicketClassifier {
    /// Score candidate labels; an empty result means no signal
    fn score(&self, interaction: &Interaction)
        -> Result<Vec<(TicketType, Confidence)>, StrategyError>;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Scores candidate priorities for an interaction
pub trait PriorityScorer {
    /// Score candidate priorities; an empty result means no signal
    fn score(&self, interaction: &Interaction) -> Result<Vec<(Priority, Confidence)>, StrategyError>;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

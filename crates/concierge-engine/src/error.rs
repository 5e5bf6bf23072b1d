//! Error types for the classifier engine

use thiserror::Error;

/// Errors that can occur during classification
#[derive(Error, Debug)]
pub enum EngineError {
    /// Every sub-classifier failed; no labels could be produced
    ///
    /// Surfaced, never silently defaulted — the routing manager queues the
    /// interaction for manual review.
    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    /// A strategy task could not be joined
    #[error("Strategy task error: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

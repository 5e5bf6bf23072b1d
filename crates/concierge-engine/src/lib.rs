//! Concierge Classifier Engine
//!
//! Assigns category labels (actor type, ticket type, priority) to a
//! normalized interaction, producing a labeled result with per-label
//! confidence.
//!
//! The engine is polymorphic over its three capabilities: actor
//! classification, ticket-type classification, and priority scoring are
//! independent strategies, each swappable (rule-based, model-delegated, or
//! anything else) without affecting the others. Spam detection is a
//! first-class ticket-type outcome, never a pre-filter: a spam verdict
//! still carries a full classification so its accuracy can be verified
//! like any other label.
//!
//! External model calls are bounded by a timeout; a strategy that fails or
//! times out contributes "no signal", and only when every strategy fails
//! does the engine surface `ClassificationUnavailable`.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod keyword;
pub mod model;
pub mod strategies;

pub use config::EngineConfig;
pub use engine::ClassifierEngine;
pub use error::EngineError;
pub use keyword::{KeywordActorClassifier, KeywordPriorityScorer, KeywordTicketClassifier};
pub use model::{ModelTicketClassifier, VerdictParseError};
pub use strategies::{ActorClassifier, PriorityScorer, StrategyError, TicketClassifier};

//! Concierge Routing & Override Manager
//!
//! Decides, from per-category confidence and business rules, whether a
//! classified interaction is auto-routed, queued for manual review, or
//! rejected as spam — and manages the override flow that reopens settled
//! interactions.
//!
//! Evaluation order is fixed: forced-review rules run first (a VIP
//! franchisee is always reviewed manually regardless of confidence), then
//! the spam threshold, then the per-category thresholds. Every threshold
//! and rule is configuration, tunable without code change.
//!
//! Routing decisions for a single interaction are serialized through
//! `DecisionGuards` so at most one decision is ever in flight, preventing
//! duplicate egress instructions.

#![warn(missing_docs)]

mod config;
mod error;
mod guards;
mod manager;
mod rules;

pub use config::RoutingConfig;
pub use error::RoutingError;
pub use guards::DecisionGuards;
pub use manager::RoutingManager;
pub use rules::ForcedReviewRule;

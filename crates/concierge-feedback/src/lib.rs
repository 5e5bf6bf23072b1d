//! Concierge Feedback Loop Tracker
//!
//! Records agent corrections and confirmations against classifier output and
//! exposes them as training signal: trailing-window accuracy per category and
//! per-label precision.
//!
//! There is no mutable "accuracy state". The tracker keeps an append-only
//! event log and recomputes every figure from it on demand, so identical logs
//! always produce identical numbers and the figures are independently
//! auditable. The log tolerates concurrent readers while a single writer
//! appends (RwLock discipline).

#![warn(missing_docs)]

mod tracker;

pub use tracker::{AuditCounters, FeedbackConfig, FeedbackTracker};

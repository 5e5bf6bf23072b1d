//! Concierge Interaction Record Normalizer
//!
//! Converts heterogeneous source payloads (call transcripts, emails, chat
//! logs, ticket threads) into the canonical `Interaction` representation.
//!
//! Normalization is deterministic: identical input always yields
//! byte-identical `normalized_text`. It performs no classification and no
//! routing; its only output is the `Interaction` itself.
//!
//! Empty results are not errors to be discarded — an interaction whose
//! normalization yields no text is still produced (flagged), carried inside
//! `NormalizerError::EmptyContent` so the caller persists it and routes it
//! to human review.

#![warn(missing_docs)]

pub mod scrub;

use concierge_domain::{ActorType, Interaction, SourceChannel};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during normalization
#[derive(Error, Debug)]
pub enum NormalizerError {
    /// The source channel string is not a recognized enum value
    #[error("Unsupported channel: {0}")]
    UnsupportedChannel(String),

    /// Normalization yielded no usable text
    ///
    /// The flagged interaction is carried in the error so it can be
    /// persisted and queued for review rather than silently dropped.
    #[error("Empty content after normalization for interaction {}", .0.id)]
    EmptyContent(Box<Interaction>),
}

/// The Normalizer produces canonical interactions from raw payloads
#[derive(Debug, Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Create a new Normalizer
    pub fn new() -> Self {
        Self
    }

    /// Normalize a payload whose channel arrives as an upstream string
    ///
    /// Fails with `UnsupportedChannel` before touching the payload if the
    /// channel is not recognized.
    pub fn normalize_raw(
        &self,
        channel: &str,
        raw_payload: &str,
        received_at: u64,
        actor_hint: Option<ActorType>,
    ) -> Result<Interaction, NormalizerError> {
        let channel = SourceChannel::parse(channel)
            .ok_or_else(|| NormalizerError::UnsupportedChannel(channel.to_string()))?;
        self.normalize(channel, raw_payload, received_at, actor_hint)
    }

    /// Normalize a payload into a canonical interaction
    pub fn normalize(
        &self,
        channel: SourceChannel,
        raw_payload: &str,
        received_at: u64,
        actor_hint: Option<ActorType>,
    ) -> Result<Interaction, NormalizerError> {
        let flattened = match channel {
            SourceChannel::Call => flatten_transcript(raw_payload),
            SourceChannel::Email => extract_email_body(raw_payload),
            SourceChannel::Chat => flatten_chat_log(raw_payload),
            SourceChannel::Ticket => flatten_ticket_thread(raw_payload),
        };

        let scrubbed = scrub::scrub(&flattened);
        let normalized_text = collapse_whitespace(&scrubbed.to_lowercase());

        debug!(
            channel = channel.as_str(),
            raw_len = raw_payload.len(),
            normalized_len = normalized_text.len(),
            "Normalized payload"
        );

        let interaction = Interaction::new(
            channel,
            raw_payload.to_string(),
            normalized_text,
            received_at,
            actor_hint,
        );

        if interaction.empty_content {
            return Err(NormalizerError::EmptyContent(Box::new(interaction)));
        }

        Ok(interaction)
    }
}

/// Flatten a call transcript into speaker-turn lines
///
/// Keeps "speaker: utterance" turns, drops bracket-only annotations such as
/// `[silence]` or `[hold music]`.
fn flatten_transcript(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !(line.starts_with('[') && line.ends_with(']')))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the fresh body of an email
///
/// Cuts quoted reply tails (`>` lines and "On ... wrote:" markers) and
/// everything after a signature delimiter.
fn extract_email_body(raw: &str) -> String {
    let mut kept = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();

        // Signature delimiter ends the useful body
        if trimmed == "--" {
            break;
        }
        // "On <date>, <someone> wrote:" introduces the quoted tail
        if trimmed.to_lowercase().starts_with("on ") && trimmed.to_lowercase().ends_with("wrote:") {
            break;
        }
        // Quoted reply lines
        if trimmed.starts_with('>') {
            continue;
        }

        kept.push(trimmed);
    }

    kept.retain(|line| !line.is_empty());
    kept.join(" ")
}

/// Flatten a chat log, stripping leading bracketed timestamps
fn flatten_chat_log(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            // "[12:01] alice: hi" -> "alice: hi"
            if line.starts_with('[') {
                match line.find(']') {
                    Some(pos) => line[pos + 1..].trim_start(),
                    None => line,
                }
            } else {
                line
            }
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenate a ticket's subject line with its thread body
///
/// The first line of the payload is the subject; the remainder is the
/// thread. Both contribute classification signal, so they are joined into
/// one text the way the original ticket analysis combined subject and
/// description.
fn flatten_ticket_thread(raw: &str) -> String {
    let mut lines = raw.lines();
    let subject = lines.next().unwrap_or("").trim();

    let body = lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if body.is_empty() {
        subject.to_string()
    } else if subject.is_empty() {
        body
    } else {
        format!("{} {}", subject, body)
    }
}

/// Collapse whitespace runs into single spaces and trim the ends
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Concierge Storage Layer
//!
//! Implements the domain store traits over SQLite with an append-only
//! discipline: interactions, classification results, overrides, and routing
//! decisions are written once and never updated in place. Review state
//! changes append to a state log; the current state is the latest entry.
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe. Each thread should have its own
//! SqliteStore instance, or the store should sit behind a lock.

#![warn(missing_docs)]

use concierge_domain::traits::{ClassificationLog, DecisionLog, InteractionStore, OverrideLog};
use concierge_domain::{
    ActorType, ClassificationId, ClassificationResult, Confidence, Interaction, InteractionId,
    LabelCategory, OverrideRecord, Priority, ReviewState, RoutingAction, RoutingDecision,
    RoutingReason, SourceChannel, TicketType,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Duplicate record detected
    #[error("Duplicate record detected")]
    Duplicate,

    /// Review state transition rejected by the state machine
    #[error("Illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: ReviewState,
        /// Rejected target state
        to: ReviewState,
    },

    /// Classification appended out of sequence
    #[error("Out-of-sequence classification: expected seq {expected}, got {got}")]
    OutOfSequence {
        /// Next free sequence number
        expected: u64,
        /// Sequence number that was submitted
        got: u64,
    },
}

/// SQLite-based implementation of the concierge store traits
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Convert an id's u128 value to bytes for storage
    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    /// Convert bytes back to a u128 id value
    fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    fn parse_actor(s: &str) -> Result<ActorType, StoreError> {
        ActorType::parse(s)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown actor type: {}", s)))
    }

    fn parse_ticket(s: &str) -> Result<TicketType, StoreError> {
        TicketType::parse(s)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown ticket type: {}", s)))
    }

    fn parse_priority(s: &str) -> Result<Priority, StoreError> {
        Priority::parse(s)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown priority: {}", s)))
    }

    /// Serialize a routing reason to JSON for the decisions table
    fn reason_to_json(reason: &RoutingReason) -> String {
        let value = match reason {
            RoutingReason::AllThresholdsMet => serde_json::json!({
                "kind": "all_thresholds_met",
            }),
            RoutingReason::BelowThreshold {
                category,
                confidence,
                threshold,
            } => serde_json::json!({
                "kind": "below_threshold",
                "category": category.as_str(),
                "confidence": confidence.value(),
                "threshold": threshold,
            }),
            RoutingReason::SpamThresholdMet { confidence } => serde_json::json!({
                "kind": "spam_threshold_met",
                "confidence": confidence.value(),
            }),
            RoutingReason::RuleForcedReview { rule } => serde_json::json!({
                "kind": "rule_forced_review",
                "rule": rule,
            }),
            RoutingReason::ClassifierUnavailable => serde_json::json!({
                "kind": "classifier_unavailable",
            }),
            RoutingReason::OperatorOverride { operator_id } => serde_json::json!({
                "kind": "operator_override",
                "operator_id": operator_id,
            }),
        };
        value.to_string()
    }

    /// Parse a routing reason back from its JSON form
    fn json_to_reason(json: &str) -> Result<RoutingReason, StoreError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Bad reason JSON: {}", e)))?;
        let kind = value
            .get("kind")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::InvalidData("Reason JSON missing 'kind'".to_string()))?;

        let get_str = |field: &str| -> Result<String, StoreError> {
            value
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    StoreError::InvalidData(format!("Reason JSON missing '{}'", field))
                })
        };
        let get_f64 = |field: &str| -> Result<f64, StoreError> {
            value.get(field).and_then(|v| v.as_f64()).ok_or_else(|| {
                StoreError::InvalidData(format!("Reason JSON missing '{}'", field))
            })
        };

        match kind {
            "all_thresholds_met" => Ok(RoutingReason::AllThresholdsMet),
            "below_threshold" => {
                let category = get_str("category")?;
                let category = LabelCategory::parse(&category).ok_or_else(|| {
                    StoreError::InvalidData(format!("Unknown category: {}", category))
                })?;
                Ok(RoutingReason::BelowThreshold {
                    category,
                    confidence: Confidence::clamped(get_f64("confidence")?),
                    threshold: get_f64("threshold")?,
                })
            }
            "spam_threshold_met" => Ok(RoutingReason::SpamThresholdMet {
                confidence: Confidence::clamped(get_f64("confidence")?),
            }),
            "rule_forced_review" => Ok(RoutingReason::RuleForcedReview {
                rule: get_str("rule")?,
            }),
            "classifier_unavailable" => Ok(RoutingReason::ClassifierUnavailable),
            "operator_override" => Ok(RoutingReason::OperatorOverride {
                operator_id: get_str("operator_id")?,
            }),
            _ => Err(StoreError::InvalidData(format!(
                "Unknown reason kind: {}",
                kind
            ))),
        }
    }

    fn row_to_classification(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClassificationResult> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let interaction_bytes: Vec<u8> = row.get(1)?;
        let actor: String = row.get(3)?;
        let ticket: String = row.get(5)?;
        let priority: String = row.get(7)?;

        let to_conv_err = |e: StoreError| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        };

        Ok(ClassificationResult {
            id: ClassificationId::from_value(
                Self::bytes_to_id(&id_bytes).map_err(to_conv_err)?,
            ),
            interaction_id: InteractionId::from_value(
                Self::bytes_to_id(&interaction_bytes).map_err(to_conv_err)?,
            ),
            seq: row.get::<_, i64>(2)? as u64,
            actor_type: Self::parse_actor(&actor).map_err(to_conv_err)?,
            actor_confidence: Confidence::clamped(row.get(4)?),
            ticket_type: Self::parse_ticket(&ticket).map_err(to_conv_err)?,
            ticket_confidence: Confidence::clamped(row.get(6)?),
            priority: Self::parse_priority(&priority).map_err(to_conv_err)?,
            priority_confidence: Confidence::clamped(row.get(8)?),
            model_version: row.get(9)?,
            classified_at: row.get::<_, i64>(10)? as u64,
        })
    }
}

impl InteractionStore for SqliteStore {
    type Error = StoreError;

    fn insert_interaction(
        &mut self,
        interaction: Interaction,
    ) -> Result<InteractionId, Self::Error> {
        let id_bytes = Self::id_to_bytes(interaction.id.value());

        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM interactions WHERE id = ?1",
                params![&id_bytes],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::Duplicate);
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO interactions (id, source_channel, raw_payload, normalized_text, received_at, actor_hint, empty_content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &id_bytes,
                interaction.source_channel.as_str(),
                &interaction.raw_payload,
                &interaction.normalized_text,
                interaction.received_at as i64,
                interaction.actor_hint.map(|a| a.as_str()),
                interaction.empty_content,
            ],
        )?;
        tx.execute(
            "INSERT INTO state_log (interaction_id, state, changed_at) VALUES (?1, ?2, ?3)",
            params![
                &id_bytes,
                ReviewState::Pending.as_str(),
                interaction.received_at as i64,
            ],
        )?;
        tx.commit()?;

        Ok(interaction.id)
    }

    fn get_interaction(&self, id: InteractionId) -> Result<Option<Interaction>, Self::Error> {
        let id_bytes = Self::id_to_bytes(id.value());

        let interaction = self
            .conn
            .query_row(
                "SELECT id, source_channel, raw_payload, normalized_text, received_at, actor_hint, empty_content
                 FROM interactions WHERE id = ?1",
                params![&id_bytes],
                |row| {
                    let id_bytes: Vec<u8> = row.get(0)?;
                    let channel: String = row.get(1)?;
                    let actor_hint: Option<String> = row.get(5)?;

                    let to_conv_err = |e: StoreError| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    };

                    let channel = SourceChannel::parse(&channel).ok_or_else(|| {
                        to_conv_err(StoreError::InvalidData(format!(
                            "Unknown source channel: {}",
                            channel
                        )))
                    })?;
                    let actor_hint = match actor_hint {
                        Some(s) => Some(Self::parse_actor(&s).map_err(to_conv_err)?),
                        None => None,
                    };

                    Ok(Interaction {
                        id: InteractionId::from_value(
                            Self::bytes_to_id(&id_bytes).map_err(to_conv_err)?,
                        ),
                        source_channel: channel,
                        raw_payload: row.get(2)?,
                        normalized_text: row.get(3)?,
                        received_at: row.get::<_, i64>(4)? as u64,
                        actor_hint,
                        empty_content: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(interaction)
    }

    fn find_by_dedup_key(
        &self,
        channel: SourceChannel,
        dedup_key: &str,
    ) -> Result<Option<InteractionId>, Self::Error> {
        let id = self
            .conn
            .query_row(
                "SELECT interaction_id FROM dedup_keys WHERE source_channel = ?1 AND dedup_key = ?2",
                params![channel.as_str(), dedup_key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        match id {
            Some(bytes) => Ok(Some(InteractionId::from_value(Self::bytes_to_id(&bytes)?))),
            None => Ok(None),
        }
    }

    fn record_dedup_key(
        &mut self,
        channel: SourceChannel,
        dedup_key: &str,
        id: InteractionId,
    ) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT OR IGNORE INTO dedup_keys (source_channel, dedup_key, interaction_id)
             VALUES (?1, ?2, ?3)",
            params![
                channel.as_str(),
                dedup_key,
                &Self::id_to_bytes(id.value())
            ],
        )?;
        Ok(())
    }

    fn review_state(&self, id: InteractionId) -> Result<Option<ReviewState>, Self::Error> {
        let id_bytes = Self::id_to_bytes(id.value());

        let state: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM state_log WHERE interaction_id = ?1
                 ORDER BY rowid DESC LIMIT 1",
                params![&id_bytes],
                |row| row.get(0),
            )
            .optional()?;

        match state {
            Some(s) => ReviewState::parse(&s)
                .map(Some)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown review state: {}", s))),
            None => Ok(None),
        }
    }

    fn set_review_state(
        &mut self,
        id: InteractionId,
        state: ReviewState,
    ) -> Result<(), Self::Error> {
        let current = self
            .review_state(id)?
            .ok_or_else(|| StoreError::NotFound(format!("Interaction {}", id)))?;

        if !current.can_transition_to(state) {
            return Err(StoreError::IllegalTransition {
                from: current,
                to: state,
            });
        }

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.conn.execute(
            "INSERT INTO state_log (interaction_id, state, changed_at) VALUES (?1, ?2, ?3)",
            params![&Self::id_to_bytes(id.value()), state.as_str(), now as i64],
        )?;
        Ok(())
    }
}

impl ClassificationLog for SqliteStore {
    type Error = StoreError;

    fn append_classification(
        &mut self,
        result: ClassificationResult,
    ) -> Result<ClassificationId, Self::Error> {
        let expected = self.next_seq(result.interaction_id)?;
        if result.seq != expected {
            return Err(StoreError::OutOfSequence {
                expected,
                got: result.seq,
            });
        }

        self.conn.execute(
            "INSERT INTO classifications (id, interaction_id, seq, actor_type, actor_confidence,
                 ticket_type, ticket_confidence, priority, priority_confidence, model_version, classified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &Self::id_to_bytes(result.id.value()),
                &Self::id_to_bytes(result.interaction_id.value()),
                result.seq as i64,
                result.actor_type.as_str(),
                result.actor_confidence.value(),
                result.ticket_type.as_str(),
                result.ticket_confidence.value(),
                result.priority.as_str(),
                result.priority_confidence.value(),
                &result.model_version,
                result.classified_at as i64,
            ],
        )?;

        Ok(result.id)
    }

    fn get_classification(
        &self,
        id: ClassificationId,
    ) -> Result<Option<ClassificationResult>, Self::Error> {
        let result = self
            .conn
            .query_row(
                "SELECT id, interaction_id, seq, actor_type, actor_confidence, ticket_type,
                        ticket_confidence, priority, priority_confidence, model_version, classified_at
                 FROM classifications WHERE id = ?1",
                params![&Self::id_to_bytes(id.value())],
                Self::row_to_classification,
            )
            .optional()?;

        Ok(result)
    }

    fn classification_history(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<ClassificationResult>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, interaction_id, seq, actor_type, actor_confidence, ticket_type,
                    ticket_confidence, priority, priority_confidence, model_version, classified_at
             FROM classifications WHERE interaction_id = ?1 ORDER BY seq ASC",
        )?;

        let results = stmt
            .query_map(
                params![&Self::id_to_bytes(interaction_id.value())],
                Self::row_to_classification,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn next_seq(&self, interaction_id: InteractionId) -> Result<u64, Self::Error> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM classifications WHERE interaction_id = ?1",
            params![&Self::id_to_bytes(interaction_id.value())],
            |row| row.get(0),
        )?;
        Ok(next as u64)
    }
}

impl OverrideLog for SqliteStore {
    type Error = StoreError;

    fn append_override(&mut self, record: OverrideRecord) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO overrides (interaction_id, original_classification_id, corrected_actor_type,
                 corrected_ticket_type, corrected_priority, operator_id, corrected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &Self::id_to_bytes(record.interaction_id.value()),
                &Self::id_to_bytes(record.original_classification_id.value()),
                record.corrected_actor_type.map(|a| a.as_str()),
                record.corrected_ticket_type.map(|t| t.as_str()),
                record.corrected_priority.map(|p| p.as_str()),
                &record.operator_id,
                record.corrected_at as i64,
            ],
        )?;
        Ok(())
    }

    fn overrides_for(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<OverrideRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT interaction_id, original_classification_id, corrected_actor_type,
                    corrected_ticket_type, corrected_priority, operator_id, corrected_at
             FROM overrides WHERE interaction_id = ?1 ORDER BY rowid ASC",
        )?;

        let records = stmt
            .query_map(params![&Self::id_to_bytes(interaction_id.value())], |row| {
                let interaction_bytes: Vec<u8> = row.get(0)?;
                let classification_bytes: Vec<u8> = row.get(1)?;
                let actor: Option<String> = row.get(2)?;
                let ticket: Option<String> = row.get(3)?;
                let priority: Option<String> = row.get(4)?;

                let to_conv_err = |e: StoreError| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                };

                Ok(OverrideRecord {
                    interaction_id: InteractionId::from_value(
                        Self::bytes_to_id(&interaction_bytes).map_err(to_conv_err)?,
                    ),
                    original_classification_id: ClassificationId::from_value(
                        Self::bytes_to_id(&classification_bytes).map_err(to_conv_err)?,
                    ),
                    corrected_actor_type: match actor {
                        Some(s) => Some(Self::parse_actor(&s).map_err(to_conv_err)?),
                        None => None,
                    },
                    corrected_ticket_type: match ticket {
                        Some(s) => Some(Self::parse_ticket(&s).map_err(to_conv_err)?),
                        None => None,
                    },
                    corrected_priority: match priority {
                        Some(s) => Some(Self::parse_priority(&s).map_err(to_conv_err)?),
                        None => None,
                    },
                    operator_id: row.get(5)?,
                    corrected_at: row.get::<_, i64>(6)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

impl DecisionLog for SqliteStore {
    type Error = StoreError;

    fn append_decision(&mut self, decision: RoutingDecision) -> Result<(), Self::Error> {
        let (action, destination) = match &decision.action {
            RoutingAction::AutoRoute { destination } => ("auto_route", Some(destination.clone())),
            RoutingAction::QueueForReview => ("queue_for_review", None),
            RoutingAction::RejectAsSpam => ("reject_as_spam", None),
        };

        self.conn.execute(
            "INSERT INTO decisions (interaction_id, classification_id, action, destination, reason, decided_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &Self::id_to_bytes(decision.interaction_id.value()),
                &Self::id_to_bytes(decision.classification_id.value()),
                action,
                destination,
                Self::reason_to_json(&decision.reason),
                decision.decided_at as i64,
            ],
        )?;
        Ok(())
    }

    fn decisions_for(
        &self,
        interaction_id: InteractionId,
    ) -> Result<Vec<RoutingDecision>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT interaction_id, classification_id, action, destination, reason, decided_at
             FROM decisions WHERE interaction_id = ?1 ORDER BY rowid ASC",
        )?;

        let decisions = stmt
            .query_map(params![&Self::id_to_bytes(interaction_id.value())], |row| {
                let interaction_bytes: Vec<u8> = row.get(0)?;
                let classification_bytes: Vec<u8> = row.get(1)?;
                let action: String = row.get(2)?;
                let destination: Option<String> = row.get(3)?;
                let reason: String = row.get(4)?;

                let to_conv_err = |e: StoreError| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                };

                let action = match action.as_str() {
                    "auto_route" => RoutingAction::AutoRoute {
                        destination: destination.unwrap_or_default(),
                    },
                    "queue_for_review" => RoutingAction::QueueForReview,
                    "reject_as_spam" => RoutingAction::RejectAsSpam,
                    other => {
                        return Err(to_conv_err(StoreError::InvalidData(format!(
                            "Unknown action: {}",
                            other
                        ))))
                    }
                };

                Ok(RoutingDecision {
                    interaction_id: InteractionId::from_value(
                        Self::bytes_to_id(&interaction_bytes).map_err(to_conv_err)?,
                    ),
                    classification_id: ClassificationId::from_value(
                        Self::bytes_to_id(&classification_bytes).map_err(to_conv_err)?,
                    ),
                    action,
                    reason: Self::json_to_reason(&reason).map_err(to_conv_err)?,
                    decided_at: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(decisions)
    }
}

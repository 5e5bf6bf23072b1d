//! Integration tests for concierge-store
//!
//! These tests verify the append-only discipline across all four logs:
//! interactions, classification history, overrides, and routing decisions.

use concierge_domain::traits::{ClassificationLog, DecisionLog, InteractionStore, OverrideLog};
use concierge_domain::{
    ActorType, ClassificationId, ClassificationResult, Confidence, Interaction, InteractionId,
    OverrideRecord, Priority, ReviewState, RoutingAction, RoutingDecision, RoutingReason,
    SourceChannel, TicketType,
};
use concierge_store::{SqliteStore, StoreError};

fn sample_interaction() -> Interaction {
    Interaction::new(
        SourceChannel::Email,
        "From: alice@example.com\n\nPlease refund my last charge.".to_string(),
        "please refund my last charge.".to_string(),
        1_700_000_000,
        Some(ActorType::ExistingMember),
    )
}

fn sample_classification(interaction_id: InteractionId, seq: u64) -> ClassificationResult {
    ClassificationResult {
        id: ClassificationId::new(),
        interaction_id,
        seq,
        actor_type: ActorType::ExistingMember,
        actor_confidence: Confidence::new(0.95),
        ticket_type: TicketType::Refund,
        ticket_confidence: Confidence::new(0.97),
        priority: Priority::Normal,
        priority_confidence: Confidence::new(0.8),
        model_version: "rules-v1".to_string(),
        classified_at: 1_700_000_100,
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_store_initialization_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concierge.db");

    let store = SqliteStore::new(&path);
    assert!(store.is_ok());
    assert!(path.exists());
}

#[test]
fn test_insert_and_get_interaction() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let interaction = sample_interaction();
    let id = store.insert_interaction(interaction.clone()).unwrap();
    assert_eq!(id, interaction.id);

    let retrieved = store.get_interaction(id).unwrap().unwrap();
    assert_eq!(retrieved.id, interaction.id);
    assert_eq!(retrieved.source_channel, SourceChannel::Email);
    assert_eq!(retrieved.raw_payload, interaction.raw_payload);
    assert_eq!(retrieved.normalized_text, interaction.normalized_text);
    assert_eq!(retrieved.received_at, interaction.received_at);
    assert_eq!(retrieved.actor_hint, Some(ActorType::ExistingMember));
    assert!(!retrieved.empty_content);
}

#[test]
fn test_duplicate_interaction_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let interaction = sample_interaction();
    store.insert_interaction(interaction.clone()).unwrap();

    let result = store.insert_interaction(interaction);
    assert!(matches!(result, Err(StoreError::Duplicate)));
}

#[test]
fn test_new_interaction_starts_pending() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let id = store.insert_interaction(sample_interaction()).unwrap();
    assert_eq!(store.review_state(id).unwrap(), Some(ReviewState::Pending));
}

#[test]
fn test_state_machine_enforced_by_store() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();

    // Legal path
    store.set_review_state(id, ReviewState::Classified).unwrap();
    store.set_review_state(id, ReviewState::AutoRouted).unwrap();

    // Illegal jump is rejected with the offending pair
    let err = store
        .set_review_state(id, ReviewState::Resolved)
        .unwrap_err();
    match err {
        StoreError::IllegalTransition { from, to } => {
            assert_eq!(from, ReviewState::AutoRouted);
            assert_eq!(to, ReviewState::Resolved);
        }
        other => panic!("Expected IllegalTransition, got {:?}", other),
    }

    // Override reopens, then resolution is legal
    store.set_review_state(id, ReviewState::UnderReview).unwrap();
    store.set_review_state(id, ReviewState::Resolved).unwrap();
    assert_eq!(store.review_state(id).unwrap(), Some(ReviewState::Resolved));
}

#[test]
fn test_set_state_on_missing_interaction() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let result = store.set_review_state(InteractionId::new(), ReviewState::Classified);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_dedup_key_lookup() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();

    store
        .record_dedup_key(SourceChannel::Email, "zoho-4711", id)
        .unwrap();

    let found = store
        .find_by_dedup_key(SourceChannel::Email, "zoho-4711")
        .unwrap();
    assert_eq!(found, Some(id));

    // Same key on a different channel is a different upstream object
    let other_channel = store
        .find_by_dedup_key(SourceChannel::Call, "zoho-4711")
        .unwrap();
    assert_eq!(other_channel, None);
}

#[test]
fn test_dedup_key_is_idempotent() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();

    store
        .record_dedup_key(SourceChannel::Email, "key-1", id)
        .unwrap();
    // Recording again with another id keeps the original mapping
    store
        .record_dedup_key(SourceChannel::Email, "key-1", InteractionId::new())
        .unwrap();

    let found = store
        .find_by_dedup_key(SourceChannel::Email, "key-1")
        .unwrap();
    assert_eq!(found, Some(id));
}

#[test]
fn test_classification_history_is_ordered_and_monotonic() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();

    assert_eq!(store.next_seq(id).unwrap(), 0);

    let first = sample_classification(id, 0);
    store.append_classification(first.clone()).unwrap();

    let mut second = sample_classification(id, 1);
    second.ticket_type = TicketType::Cancellation;
    second.model_version = "rules-v2".to_string();
    store.append_classification(second.clone()).unwrap();

    let history = store.classification_history(id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].seq, 0);
    assert_eq!(history[0].ticket_type, TicketType::Refund);
    assert_eq!(history[1].seq, 1);
    assert_eq!(history[1].ticket_type, TicketType::Cancellation);
    assert_eq!(store.next_seq(id).unwrap(), 2);
}

#[test]
fn test_out_of_sequence_classification_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();

    let result = store.append_classification(sample_classification(id, 3));
    assert!(matches!(
        result,
        Err(StoreError::OutOfSequence {
            expected: 0,
            got: 3
        })
    ));
}

#[test]
fn test_get_classification_by_id() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();

    let result = sample_classification(id, 0);
    store.append_classification(result.clone()).unwrap();

    let retrieved = store.get_classification(result.id).unwrap().unwrap();
    assert_eq!(retrieved, result);

    assert!(store
        .get_classification(ClassificationId::new())
        .unwrap()
        .is_none());
}

#[test]
fn test_override_log_round_trip() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();
    let classification = sample_classification(id, 0);
    store.append_classification(classification.clone()).unwrap();

    let record = OverrideRecord {
        interaction_id: id,
        original_classification_id: classification.id,
        corrected_actor_type: None,
        corrected_ticket_type: Some(TicketType::Cancellation),
        corrected_priority: Some(Priority::High),
        operator_id: "op-12".to_string(),
        corrected_at: 1_700_000_200,
    };
    store.append_override(record.clone()).unwrap();

    let records = store.overrides_for(id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], record);
}

#[test]
fn test_overrides_preserved_in_order() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();
    let classification = sample_classification(id, 0);
    store.append_classification(classification.clone()).unwrap();

    for (n, operator) in ["op-1", "op-2"].iter().enumerate() {
        store
            .append_override(OverrideRecord {
                interaction_id: id,
                original_classification_id: classification.id,
                corrected_actor_type: None,
                corrected_ticket_type: Some(TicketType::Cancellation),
                corrected_priority: None,
                operator_id: operator.to_string(),
                corrected_at: 1_700_000_200 + n as u64,
            })
            .unwrap();
    }

    // Conflicting overrides are both preserved, oldest first
    let records = store.overrides_for(id).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].operator_id, "op-1");
    assert_eq!(records[1].operator_id, "op-2");
}

#[test]
fn test_decision_log_round_trip() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let id = store.insert_interaction(sample_interaction()).unwrap();
    let classification = sample_classification(id, 0);
    store.append_classification(classification.clone()).unwrap();

    let auto = RoutingDecision {
        interaction_id: id,
        classification_id: classification.id,
        action: RoutingAction::AutoRoute {
            destination: "billing-queue".to_string(),
        },
        reason: RoutingReason::AllThresholdsMet,
        decided_at: 1_700_000_150,
    };
    let spam = RoutingDecision {
        interaction_id: id,
        classification_id: classification.id,
        action: RoutingAction::RejectAsSpam,
        reason: RoutingReason::SpamThresholdMet {
            confidence: Confidence::new(0.99),
        },
        decided_at: 1_700_000_160,
    };

    store.append_decision(auto.clone()).unwrap();
    store.append_decision(spam.clone()).unwrap();

    let decisions = store.decisions_for(id).unwrap();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0], auto);
    assert_eq!(decisions[1], spam);
}

#[test]
fn test_empty_content_interaction_is_persisted() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let interaction = Interaction::new(
        SourceChannel::Chat,
        "<attachment only>".to_string(),
        String::new(),
        1_700_000_000,
        None,
    );
    let id = store.insert_interaction(interaction).unwrap();

    // Flagged, never dropped: still queryable with the flag set
    let retrieved = store.get_interaction(id).unwrap().unwrap();
    assert!(retrieved.empty_content);
}

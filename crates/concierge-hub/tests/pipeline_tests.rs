//! End-to-end pipeline tests
//!
//! These exercise the full control flow — ingress dedup, normalization,
//! classification, routing, egress, review, overrides, feedback — against
//! an in-memory SQLite store and the recording gateway adapter.

use concierge_domain::{
    ActorType, ClassificationId, Confidence, Interaction, LabelCategory, OverrideRecord, Priority,
    ReviewState, RoutingReason, SourceChannel, TicketType,
};
use concierge_engine::{
    ActorClassifier, ClassifierEngine, EngineConfig, PriorityScorer, StrategyError,
    TicketClassifier,
};
use concierge_feedback::FeedbackTracker;
use concierge_gateway::{
    EgressInstruction, MemoryAlertSink, MemoryGateway, RetryingEgress,
};
use concierge_hub::{Disposition, HubError, Pipeline};
use concierge_routing::RoutingManager;
use concierge_store::SqliteStore;
use std::time::Duration;

#[derive(Clone)]
struct StubActor(ActorType, f64);

impl ActorClassifier for StubActor {
    fn score(
        &self,
        _interaction: &Interaction,
    ) -> Result<Vec<(ActorType, Confidence)>, StrategyError> {
        Ok(vec![(self.0, Confidence::new(self.1))])
    }
    fn name(&self) -> &str {
        "stub-actor"
    }
}

#[derive(Clone)]
struct StubTicket(TicketType, f64);

impl TicketClassifier for StubTicket {
    fn score(
        &self,
        _interaction: &Interaction,
    ) -> Result<Vec<(TicketType, Confidence)>, StrategyError> {
        Ok(vec![(self.0, Confidence::new(self.1))])
    }
    fn name(&self) -> &str {
        "stub-ticket"
    }
}

#[derive(Clone)]
struct StubPriority(Priority, f64);

impl PriorityScorer for StubPriority {
    fn score(
        &self,
        _interaction: &Interaction,
    ) -> Result<Vec<(Priority, Confidence)>, StrategyError> {
        Ok(vec![(self.0, Confidence::new(self.1))])
    }
    fn name(&self) -> &str {
        "stub-priority"
    }
}

struct FailingActor;
impl ActorClassifier for FailingActor {
    fn score(
        &self,
        _interaction: &Interaction,
    ) -> Result<Vec<(ActorType, Confidence)>, StrategyError> {
        Err(StrategyError::Unavailable("model unreachable".to_string()))
    }
    fn name(&self) -> &str {
        "failing-actor"
    }
}

struct FailingTicket;
impl TicketClassifier for FailingTicket {
    fn score(
        &self,
        _interaction: &Interaction,
    ) -> Result<Vec<(TicketType, Confidence)>, StrategyError> {
        Err(StrategyError::Unavailable("model unreachable".to_string()))
    }
    fn name(&self) -> &str {
        "failing-ticket"
    }
}

struct FailingPriority;
impl PriorityScorer for FailingPriority {
    fn score(
        &self,
        _interaction: &Interaction,
    ) -> Result<Vec<(Priority, Confidence)>, StrategyError> {
        Err(StrategyError::Unavailable("model unreachable".to_string()))
    }
    fn name(&self) -> &str {
        "failing-priority"
    }
}

type StubPipeline =
    Pipeline<SqliteStore, StubActor, StubTicket, StubPriority, MemoryGateway, MemoryAlertSink>;

fn build_pipeline(
    actor: StubActor,
    ticket: StubTicket,
    priority: StubPriority,
) -> (StubPipeline, MemoryGateway, MemoryAlertSink) {
    let store = SqliteStore::new(":memory:").unwrap();
    let engine = ClassifierEngine::new(actor, ticket, priority, EngineConfig::default());
    let router = RoutingManager::default_config();
    let gateway = MemoryGateway::new();
    let alerts = MemoryAlertSink::new();
    let egress = RetryingEgress::new(gateway.clone(), alerts.clone())
        .with_max_attempts(3)
        .with_base_delay(Duration::from_millis(1));
    let feedback = FeedbackTracker::default();

    (
        Pipeline::new(store, engine, router, egress, feedback),
        gateway,
        alerts,
    )
}

/// Confident on every axis, no rule match
fn confident_stubs() -> (StubActor, StubTicket, StubPriority) {
    (
        StubActor(ActorType::ExistingMember, 0.95),
        StubTicket(TicketType::Refund, 0.97),
        StubPriority(Priority::Normal, 0.8),
    )
}

#[tokio::test]
async fn test_confident_interaction_auto_routes_exactly_once() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, alerts) = build_pipeline(actor, ticket, priority);

    let outcome = pipeline
        .process(
            "email",
            "Please refund my last charge.",
            1_700_000_000,
            None,
            "zoho-1001",
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.disposition,
        Disposition::AutoRouted {
            destination: "billing-queue".to_string()
        }
    );
    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::AutoRouted)
    );

    // Exactly one routing instruction, nothing else
    let instructions = gateway.instructions();
    assert_eq!(instructions.len(), 1);
    match &instructions[0] {
        EgressInstruction::Route {
            interaction_id,
            destination,
            metadata,
        } => {
            assert_eq!(*interaction_id, outcome.interaction_id);
            assert_eq!(destination, "billing-queue");
            assert_eq!(metadata.ticket_type, "refund");
        }
        other => panic!("Expected Route instruction, got {:?}", other),
    }
    assert!(alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_confident_spam_is_suppressed_with_no_normal_egress() {
    let (pipeline, gateway, _alerts) = build_pipeline(
        StubActor(ActorType::External, 0.9),
        StubTicket(TicketType::Spam, 0.99),
        StubPriority(Priority::Low, 0.7),
    );

    let outcome = pipeline
        .process(
            "call",
            "Agent: Hello.\nCaller: Act now for a limited time offer.",
            1_700_000_000,
            None,
            "ring-2002",
        )
        .await
        .unwrap();

    assert_eq!(outcome.disposition, Disposition::RejectedSpam);
    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::RejectedSpam)
    );

    let instructions = gateway.instructions();
    assert_eq!(
        instructions,
        vec![EgressInstruction::Suppress {
            interaction_id: outcome.interaction_id
        }]
    );
}

#[tokio::test]
async fn test_classification_unavailable_always_lands_in_review() {
    let store = SqliteStore::new(":memory:").unwrap();
    let engine = ClassifierEngine::new(
        FailingActor,
        FailingTicket,
        FailingPriority,
        EngineConfig::default(),
    );
    let gateway = MemoryGateway::new();
    let alerts = MemoryAlertSink::new();
    let egress = RetryingEgress::new(gateway.clone(), alerts.clone())
        .with_max_attempts(3)
        .with_base_delay(Duration::from_millis(1));
    let pipeline = Pipeline::new(
        store,
        engine,
        RoutingManager::default_config(),
        egress,
        FeedbackTracker::default(),
    );

    let outcome = pipeline
        .process("chat", "[12:01] bob: hello?", 1_700_000_000, None, "chat-3003")
        .await
        .unwrap();

    // Never AutoRouted: unavailability degrades to human review
    assert_eq!(outcome.disposition, Disposition::QueuedForReview);
    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::UnderReview)
    );

    let review = pipeline.review_queue();
    assert_eq!(review.len(), 1);
    assert_eq!(
        review.pending()[0].reason,
        RoutingReason::ClassifierUnavailable
    );

    assert_eq!(
        gateway.instructions(),
        vec![EgressInstruction::EnqueueReview {
            interaction_id: outcome.interaction_id,
            queue: "review".to_string()
        }]
    );

    // No classification was produced, but the interaction is queryable
    assert!(pipeline
        .classification_history(outcome.interaction_id)
        .unwrap()
        .is_empty());
    assert!(pipeline
        .interaction(outcome.interaction_id)
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_reingestion_with_same_dedup_key_is_idempotent() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, _alerts) = build_pipeline(actor, ticket, priority);

    let first = pipeline
        .process("email", "Refund please.", 1_700_000_000, None, "zoho-1001")
        .await
        .unwrap();
    let second = pipeline
        .process("email", "Refund please.", 1_700_000_050, None, "zoho-1001")
        .await
        .unwrap();

    // Same upstream object, same interaction id, no second processing
    assert_eq!(second.interaction_id, first.interaction_id);
    assert_eq!(second.disposition, Disposition::Duplicate);
    assert_eq!(gateway.instructions().len(), 1);
    assert_eq!(
        pipeline
            .classification_history(first.interaction_id)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_empty_content_is_persisted_and_reviewed() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, _alerts) = build_pipeline(actor, ticket, priority);

    let outcome = pipeline
        .process(
            "call",
            "[silence]\n[hold music]",
            1_700_000_000,
            None,
            "ring-4004",
        )
        .await
        .unwrap();

    assert_eq!(outcome.disposition, Disposition::QueuedForReview);

    let interaction = pipeline
        .interaction(outcome.interaction_id)
        .unwrap()
        .unwrap();
    assert!(interaction.empty_content);
    assert_eq!(interaction.raw_payload, "[silence]\n[hold music]");

    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::UnderReview)
    );
    assert_eq!(gateway.instructions().len(), 1);
}

#[tokio::test]
async fn test_unsupported_channel_is_rejected() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, _alerts) = build_pipeline(actor, ticket, priority);

    let result = pipeline
        .process("fax", "anything", 1_700_000_000, None, "fax-1")
        .await;

    assert!(matches!(result, Err(HubError::UnsupportedChannel(_))));
    assert!(gateway.instructions().is_empty());
}

#[tokio::test]
async fn test_override_reopens_and_resolves_and_feeds_accuracy() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, _gateway, _alerts) = build_pipeline(actor, ticket, priority);

    let outcome = pipeline
        .process("email", "Refund please.", 1_700_000_000, None, "zoho-1001")
        .await
        .unwrap();
    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::AutoRouted)
    );

    let classification = pipeline
        .classification_history(outcome.interaction_id)
        .unwrap()
        .pop()
        .unwrap();

    // Operator corrects refund -> cancellation on the settled interaction
    pipeline
        .submit_override(OverrideRecord {
            interaction_id: outcome.interaction_id,
            original_classification_id: classification.id,
            corrected_actor_type: None,
            corrected_ticket_type: Some(TicketType::Cancellation),
            corrected_priority: None,
            operator_id: "op-9".to_string(),
            corrected_at: 1_700_000_200,
        })
        .await
        .unwrap();

    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::Resolved)
    );

    // The correction shows up in the trailing accuracy window
    let feedback = pipeline.feedback();
    assert_eq!(feedback.accuracy(LabelCategory::Ticket), 0.0);
    assert_eq!(feedback.accuracy(LabelCategory::Actor), 1.0);
    assert_eq!(
        feedback.precision_by_label(LabelCategory::Ticket, "refund"),
        Some(0.0)
    );

    // The original classification is preserved, untouched
    let history = pipeline
        .classification_history(outcome.interaction_id)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ticket_type, TicketType::Refund);
}

#[tokio::test]
async fn test_invalid_override_is_rejected_not_applied() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, _gateway, _alerts) = build_pipeline(actor, ticket, priority);

    let outcome = pipeline
        .process("email", "Refund please.", 1_700_000_000, None, "zoho-1001")
        .await
        .unwrap();

    let result = pipeline
        .submit_override(OverrideRecord {
            interaction_id: outcome.interaction_id,
            // References a classification that does not exist
            original_classification_id: ClassificationId::new(),
            corrected_actor_type: None,
            corrected_ticket_type: Some(TicketType::Cancellation),
            corrected_priority: None,
            operator_id: "op-9".to_string(),
            corrected_at: 1_700_000_200,
        })
        .await;

    assert!(matches!(result, Err(HubError::InvalidOverride(_))));
    // State untouched by the rejected override
    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::AutoRouted)
    );
}

#[tokio::test]
async fn test_cancelled_interaction_discards_decision() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, _alerts) = build_pipeline(actor, ticket, priority);

    // Source ticket deleted before the delivery is processed
    pipeline.cancel_by_dedup_key(SourceChannel::Email, "zoho-1001");

    let outcome = pipeline
        .process("email", "Refund please.", 1_700_000_000, None, "zoho-1001")
        .await
        .unwrap();

    assert_eq!(outcome.disposition, Disposition::Discarded);
    // Classification was allowed to finish and is in the history
    assert_eq!(
        pipeline
            .classification_history(outcome.interaction_id)
            .unwrap()
            .len(),
        1
    );
    // The decision was recorded for audit but never acted upon
    assert_eq!(pipeline.decisions(outcome.interaction_id).unwrap().len(), 1);
    assert!(gateway.instructions().is_empty());
    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::Classified)
    );
}

#[tokio::test]
async fn test_forced_review_then_implicit_confirmation() {
    // Confident franchisee: thresholds pass but the VIP rule forces review
    let (pipeline, gateway, _alerts) = build_pipeline(
        StubActor(ActorType::Franchisee, 0.95),
        StubTicket(TicketType::AccountPayment, 0.97),
        StubPriority(Priority::Normal, 0.8),
    );

    let outcome = pipeline
        .process(
            "ticket",
            "Royalty question\nQuestion about this month's invoice.",
            1_700_000_000,
            None,
            "click-5005",
        )
        .await
        .unwrap();

    assert_eq!(outcome.disposition, Disposition::QueuedForReview);
    assert!(matches!(
        &pipeline.review_queue().pending()[0].reason,
        RoutingReason::RuleForcedReview { rule } if rule == "vip_franchisee"
    ));
    assert_eq!(gateway.instructions().len(), 1);

    // Operator looks, agrees, closes without an override
    pipeline.resolve(outcome.interaction_id).unwrap();

    assert_eq!(
        pipeline.interaction_state(outcome.interaction_id).unwrap(),
        Some(ReviewState::Resolved)
    );
    assert!(pipeline.review_queue().is_empty());

    let counters = pipeline.feedback().audit_counters();
    assert_eq!(counters.implicit_confirmations, 1);
    assert_eq!(counters.corrections, 0);
}

#[tokio::test]
async fn test_egress_retry_recovers_from_transient_failure() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, alerts) = build_pipeline(actor, ticket, priority);

    gateway.fail_next(2);

    let outcome = pipeline
        .process("email", "Refund please.", 1_700_000_000, None, "zoho-1001")
        .await
        .unwrap();

    assert!(matches!(outcome.disposition, Disposition::AutoRouted { .. }));
    // Two transient failures absorbed; exactly one instruction, no alert
    assert_eq!(gateway.instructions().len(), 1);
    assert!(alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_exhausted_egress_retries_alert_operator() {
    let (actor, ticket, priority) = confident_stubs();
    let (pipeline, gateway, alerts) = build_pipeline(actor, ticket, priority);

    gateway.fail_next(10);

    let result = pipeline
        .process("email", "Refund please.", 1_700_000_000, None, "zoho-1001")
        .await;

    assert!(matches!(result, Err(HubError::Egress(_))));
    // Never silently dropped: the failure reached the alert channel
    assert_eq!(alerts.alerts().len(), 1);
    assert!(gateway.instructions().is_empty());
}

//! Core pipeline implementation

use crate::review::{ReviewItem, ReviewQueue};
use crate::HubError;
use concierge_domain::traits::{ClassificationLog, DecisionLog, InteractionStore, OverrideLog};
use concierge_domain::{
    ActorType, InteractionId, OverrideRecord, ReviewState, RoutingAction, RoutingReason,
    SourceChannel,
};
use concierge_engine::{
    ActorClassifier, ClassifierEngine, EngineError, PriorityScorer, TicketClassifier,
};
use concierge_feedback::FeedbackTracker;
use concierge_gateway::{AlertSink, EgressPort, RetryingEgress, RoutingMetadata};
use concierge_normalizer::{Normalizer, NormalizerError};
use concierge_routing::{DecisionGuards, RoutingManager};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// How the pipeline disposed of a delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Routed automatically to a destination
    AutoRouted {
        /// Destination the interaction went to
        destination: String,
    },

    /// Waiting for an operator
    QueuedForReview,

    /// Suppressed as spam
    RejectedSpam,

    /// The dedup key was already ingested; nothing was re-processed
    Duplicate,

    /// The source ticket was cancelled; the decision was discarded
    Discarded,
}

/// Result of processing one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Interaction the delivery resolved to
    pub interaction_id: InteractionId,

    /// What happened to it
    pub disposition: Disposition,
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The hub pipeline: ingress dedup, normalize, classify, decide, egress
///
/// Generic over the store, the three classifier strategies, and the egress
/// adapter, so tests and deployments wire their own infrastructure.
pub struct Pipeline<S, A, T, P, E, K>
where
    S: InteractionStore + ClassificationLog + OverrideLog + DecisionLog,
    A: ActorClassifier,
    T: TicketClassifier,
    P: PriorityScorer,
    E: EgressPort,
    K: AlertSink,
{
    store: Arc<Mutex<S>>,
    normalizer: Normalizer,
    engine: ClassifierEngine<A, T, P>,
    router: RoutingManager,
    egress: RetryingEgress<E, K>,
    feedback: Arc<FeedbackTracker>,
    review: Arc<ReviewQueue>,
    guards: DecisionGuards,
    review_queue: String,
    cancelled: Mutex<HashSet<InteractionId>>,
    pending_cancel: Mutex<HashSet<(SourceChannel, String)>>,
}

impl<S, A, T, P, E, K> Pipeline<S, A, T, P, E, K>
where
    S: InteractionStore + ClassificationLog + OverrideLog + DecisionLog,
    <S as InteractionStore>::Error: std::fmt::Display,
    <S as ClassificationLog>::Error: std::fmt::Display,
    <S as OverrideLog>::Error: std::fmt::Display,
    <S as DecisionLog>::Error: std::fmt::Display,
    A: ActorClassifier + Send + Sync + 'static,
    T: TicketClassifier + Send + Sync + 'static,
    P: PriorityScorer + Send + Sync + 'static,
    E: EgressPort + Send + Sync + 'static,
    E::Error: std::fmt::Display + Send,
    K: AlertSink,
{
    /// Assemble a pipeline from its parts
    pub fn new(
        store: S,
        engine: ClassifierEngine<A, T, P>,
        router: RoutingManager,
        egress: RetryingEgress<E, K>,
        feedback: FeedbackTracker,
    ) -> Self {
        let review_queue = router.config().review_queue.clone();
        Self {
            store: Arc::new(Mutex::new(store)),
            normalizer: Normalizer::new(),
            engine,
            router,
            egress,
            feedback: Arc::new(feedback),
            review: Arc::new(ReviewQueue::new()),
            guards: DecisionGuards::new(),
            review_queue,
            cancelled: Mutex::new(HashSet::new()),
            pending_cancel: Mutex::new(HashSet::new()),
        }
    }

    /// Handle on the feedback tracker (accuracy, precision, audit)
    pub fn feedback(&self) -> Arc<FeedbackTracker> {
        Arc::clone(&self.feedback)
    }

    /// Handle on the review queue
    pub fn review_queue(&self) -> Arc<ReviewQueue> {
        Arc::clone(&self.review)
    }

    /// Process one delivery end to end
    ///
    /// Idempotent per dedup key: re-delivering the same upstream object
    /// returns the original interaction id without re-processing.
    /// Normalizer and classifier failures degrade the interaction to
    /// `UnderReview`; they never crash the pipeline or lose data.
    pub async fn process(
        &self,
        channel: &str,
        payload: &str,
        received_at: u64,
        actor_hint: Option<ActorType>,
        dedup_key: &str,
    ) -> Result<ProcessOutcome, HubError> {
        let parsed = SourceChannel::parse(channel)
            .ok_or_else(|| HubError::UnsupportedChannel(channel.to_string()))?;

        // Idempotent ingress
        {
            let store = self.lock_store()?;
            if let Some(existing) = store
                .find_by_dedup_key(parsed, dedup_key)
                .map_err(|e| HubError::Store(e.to_string()))?
            {
                debug!(
                    interaction_id = %existing,
                    dedup_key,
                    "Delivery already ingested, skipping"
                );
                return Ok(ProcessOutcome {
                    interaction_id: existing,
                    disposition: Disposition::Duplicate,
                });
            }
        }

        // Normalize; empty content is persisted and reviewed, never dropped
        let interaction = match self
            .normalizer
            .normalize(parsed, payload, received_at, actor_hint)
        {
            Ok(interaction) => interaction,
            Err(NormalizerError::EmptyContent(interaction)) => {
                let interaction = *interaction;
                let id = interaction.id;
                warn!(interaction_id = %id, "Normalization yielded empty content");
                self.persist_new(interaction, parsed, dedup_key)?;
                self.degrade_to_review(
                    id,
                    RoutingReason::RuleForcedReview {
                        rule: "empty_content".to_string(),
                    },
                )
                .await?;
                return Ok(ProcessOutcome {
                    interaction_id: id,
                    disposition: Disposition::QueuedForReview,
                });
            }
            Err(NormalizerError::UnsupportedChannel(c)) => {
                return Err(HubError::UnsupportedChannel(c))
            }
        };

        let id = interaction.id;
        self.persist_new(interaction.clone(), parsed, dedup_key)?;

        // Classify; total failure degrades to review
        let seq = {
            let store = self.lock_store()?;
            store
                .next_seq(id)
                .map_err(|e| HubError::Store(e.to_string()))?
        };
        let result = match self
            .engine
            .classify(&interaction, seq, Some(&*self.feedback))
            .await
        {
            Ok(result) => result,
            Err(EngineError::ClassificationUnavailable(detail)) => {
                warn!(interaction_id = %id, detail = %detail, "Classification unavailable");
                self.degrade_to_review(id, RoutingReason::ClassifierUnavailable)
                    .await?;
                return Ok(ProcessOutcome {
                    interaction_id: id,
                    disposition: Disposition::QueuedForReview,
                });
            }
            Err(e) => {
                warn!(interaction_id = %id, error = %e, "Classifier engine error");
                self.degrade_to_review(id, RoutingReason::ClassifierUnavailable)
                    .await?;
                return Ok(ProcessOutcome {
                    interaction_id: id,
                    disposition: Disposition::QueuedForReview,
                });
            }
        };

        {
            let mut store = self.lock_store()?;
            store
                .append_classification(result.clone())
                .map_err(|e| HubError::Store(e.to_string()))?;
            store
                .set_review_state(id, ReviewState::Classified)
                .map_err(|e| HubError::Store(e.to_string()))?;
        }

        // Source-side cancellation: classification finished above, but the
        // decision is recorded as discarded and never acted upon
        if self.is_cancelled(id, parsed, dedup_key) {
            let decision = self.router.decide(&interaction, &result, now());
            let mut store = self.lock_store()?;
            store
                .append_decision(decision)
                .map_err(|e| HubError::Store(e.to_string()))?;
            info!(interaction_id = %id, "Interaction cancelled upstream, decision discarded");
            return Ok(ProcessOutcome {
                interaction_id: id,
                disposition: Disposition::Discarded,
            });
        }

        // At most one routing decision in flight per interaction
        let guard = self.guards.guard(id);
        let _held = guard.lock().await;

        let decision = self.router.decide(&interaction, &result, now());
        {
            let mut store = self.lock_store()?;
            store
                .append_decision(decision.clone())
                .map_err(|e| HubError::Store(e.to_string()))?;
            store
                .set_review_state(id, RoutingManager::target_state(&decision.action))
                .map_err(|e| HubError::Store(e.to_string()))?;
        }

        let disposition = match &decision.action {
            RoutingAction::AutoRoute { destination } => {
                let metadata = RoutingMetadata {
                    ticket_type: result.ticket_type.as_str().to_string(),
                    actor_type: result.actor_type.as_str().to_string(),
                    priority: result.priority.as_str().to_string(),
                };
                self.egress.route(id, destination, &metadata).await?;
                self.feedback.record_resolution(result.clone());
                self.guards.retire(id);
                Disposition::AutoRouted {
                    destination: destination.clone(),
                }
            }
            RoutingAction::QueueForReview => {
                self.review.push(ReviewItem {
                    interaction_id: id,
                    queue: self.review_queue.clone(),
                    reason: decision.reason.clone(),
                    enqueued_at: now(),
                });
                self.egress.enqueue_review(id, &self.review_queue).await?;
                Disposition::QueuedForReview
            }
            RoutingAction::RejectAsSpam => {
                self.egress.suppress(id).await?;
                self.feedback.record_resolution(result.clone());
                self.guards.retire(id);
                Disposition::RejectedSpam
            }
        };

        Ok(ProcessOutcome {
            interaction_id: id,
            disposition,
        })
    }

    /// Apply an operator override
    ///
    /// Reopens the interaction to `UnderReview`, records the override (the
    /// original classification is untouched), feeds the tracker, and
    /// resolves. Overrides referencing a nonexistent or foreign
    /// classification are rejected and logged, never applied.
    pub async fn submit_override(&self, record: OverrideRecord) -> Result<(), HubError> {
        let classification = {
            let store = self.lock_store()?;
            store
                .get_classification(record.original_classification_id)
                .map_err(|e| HubError::Store(e.to_string()))?
        };

        if let Err(e) = self
            .router
            .validate_override(classification.as_ref(), &record)
        {
            warn!(
                interaction_id = %record.interaction_id,
                operator = %record.operator_id,
                error = %e,
                "Override rejected"
            );
            return Err(HubError::InvalidOverride(e.to_string()));
        }
        let classification = classification.ok_or_else(|| {
            HubError::InvalidOverride("classification disappeared during validation".to_string())
        })?;

        let id = record.interaction_id;
        let current = self.current_state(id)?;

        // Reopen a settled interaction before applying the correction
        if current.is_settled() {
            let mut store = self.lock_store()?;
            store
                .set_review_state(id, ReviewState::UnderReview)
                .map_err(|e| HubError::Store(e.to_string()))?;
        } else if current != ReviewState::UnderReview {
            return Err(HubError::InvalidOverride(format!(
                "interaction in state {} cannot be overridden",
                current
            )));
        }

        {
            let mut store = self.lock_store()?;
            store
                .append_override(record.clone())
                .map_err(|e| HubError::Store(e.to_string()))?;
        }
        self.feedback.record_override(classification, record.clone());

        // The submitted correction doubles as the operator's resolution
        {
            let mut store = self.lock_store()?;
            store
                .set_review_state(id, ReviewState::Resolved)
                .map_err(|e| HubError::Store(e.to_string()))?;
        }
        self.review.remove(id);

        info!(
            interaction_id = %id,
            operator = %record.operator_id,
            confirmation = record.is_confirmation(),
            "Override applied and interaction resolved"
        );
        Ok(())
    }

    /// Resolve an interaction under review without an override
    ///
    /// This is the implicit-confirmation path: the operator looked, agreed,
    /// and closed it.
    pub fn resolve(&self, interaction_id: InteractionId) -> Result<(), HubError> {
        let current = self.current_state(interaction_id)?;
        if current != ReviewState::UnderReview {
            return Err(HubError::Store(format!(
                "interaction {} is not under review (state: {})",
                interaction_id, current
            )));
        }

        let latest = {
            let store = self.lock_store()?;
            store
                .classification_history(interaction_id)
                .map_err(|e| HubError::Store(e.to_string()))?
                .pop()
        };

        {
            let mut store = self.lock_store()?;
            store
                .set_review_state(interaction_id, ReviewState::Resolved)
                .map_err(|e| HubError::Store(e.to_string()))?;
        }

        // Interactions that never got classified (empty content,
        // classifier unavailable) resolve without feedback signal
        if let Some(result) = latest {
            self.feedback.record_resolution(result);
        }
        self.review.remove(interaction_id);

        info!(interaction_id = %interaction_id, "Interaction resolved");
        Ok(())
    }

    /// Mark an interaction cancelled upstream
    ///
    /// In-flight classification is allowed to finish; the routing decision
    /// is discarded rather than acted upon.
    pub fn cancel(&self, interaction_id: InteractionId) {
        self.cancelled
            .lock()
            .expect("cancellation set lock poisoned")
            .insert(interaction_id);
    }

    /// Mark a not-yet-ingested delivery cancelled by its dedup key
    pub fn cancel_by_dedup_key(&self, channel: SourceChannel, dedup_key: &str) {
        let known = {
            match self.lock_store() {
                Ok(store) => store.find_by_dedup_key(channel, dedup_key).ok().flatten(),
                Err(_) => None,
            }
        };

        match known {
            Some(id) => self.cancel(id),
            None => {
                self.pending_cancel
                    .lock()
                    .expect("cancellation set lock poisoned")
                    .insert((channel, dedup_key.to_string()));
            }
        }
    }

    fn is_cancelled(&self, id: InteractionId, channel: SourceChannel, dedup_key: &str) -> bool {
        if self
            .cancelled
            .lock()
            .expect("cancellation set lock poisoned")
            .contains(&id)
        {
            return true;
        }
        self.pending_cancel
            .lock()
            .expect("cancellation set lock poisoned")
            .contains(&(channel, dedup_key.to_string()))
    }

    /// Persist a freshly normalized interaction and its dedup key
    fn persist_new(
        &self,
        interaction: concierge_domain::Interaction,
        channel: SourceChannel,
        dedup_key: &str,
    ) -> Result<(), HubError> {
        let mut store = self.lock_store()?;
        let id = interaction.id;
        store
            .insert_interaction(interaction)
            .map_err(|e| HubError::Store(e.to_string()))?;
        store
            .record_dedup_key(channel, dedup_key, id)
            .map_err(|e| HubError::Store(e.to_string()))?;
        Ok(())
    }

    /// Move an unclassifiable interaction to review
    async fn degrade_to_review(
        &self,
        id: InteractionId,
        reason: RoutingReason,
    ) -> Result<(), HubError> {
        {
            let mut store = self.lock_store()?;
            store
                .set_review_state(id, ReviewState::UnderReview)
                .map_err(|e| HubError::Store(e.to_string()))?;
        }
        self.review.push(ReviewItem {
            interaction_id: id,
            queue: self.review_queue.clone(),
            reason,
            enqueued_at: now(),
        });
        self.egress.enqueue_review(id, &self.review_queue).await?;
        Ok(())
    }

    /// Current review state of an interaction
    pub fn interaction_state(
        &self,
        id: InteractionId,
    ) -> Result<Option<ReviewState>, HubError> {
        let store = self.lock_store()?;
        store
            .review_state(id)
            .map_err(|e| HubError::Store(e.to_string()))
    }

    /// A persisted interaction, regardless of downstream failures
    pub fn interaction(
        &self,
        id: InteractionId,
    ) -> Result<Option<concierge_domain::Interaction>, HubError> {
        let store = self.lock_store()?;
        store
            .get_interaction(id)
            .map_err(|e| HubError::Store(e.to_string()))
    }

    /// Full classification history for an interaction, ordered by `seq`
    pub fn classification_history(
        &self,
        id: InteractionId,
    ) -> Result<Vec<concierge_domain::ClassificationResult>, HubError> {
        let store = self.lock_store()?;
        store
            .classification_history(id)
            .map_err(|e| HubError::Store(e.to_string()))
    }

    /// All routing decisions for an interaction, including discarded ones
    pub fn decisions(
        &self,
        id: InteractionId,
    ) -> Result<Vec<concierge_domain::RoutingDecision>, HubError> {
        let store = self.lock_store()?;
        store
            .decisions_for(id)
            .map_err(|e| HubError::Store(e.to_string()))
    }

    fn current_state(&self, id: InteractionId) -> Result<ReviewState, HubError> {
        let store = self.lock_store()?;
        store
            .review_state(id)
            .map_err(|e| HubError::Store(e.to_string()))?
            .ok_or_else(|| HubError::Store(format!("interaction {} not found", id)))
    }

    fn lock_store(&self) -> Result<std::sync::MutexGuard<'_, S>, HubError> {
        self.store
            .lock()
            .map_err(|e| HubError::Store(format!("store lock poisoned: {}", e)))
    }
}

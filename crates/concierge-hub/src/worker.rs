//! Background worker loop for continuous pipeline operation

use crate::pipeline::Pipeline;
use crate::HubError;
use concierge_domain::traits::{ClassificationLog, DecisionLog, InteractionStore, OverrideLog};
use concierge_domain::ActorType;
use concierge_engine::{ActorClassifier, PriorityScorer, TicketClassifier};
use concierge_gateway::{AlertSink, EgressPort};
use tokio::sync::mpsc;
use tracing::{error, info};

/// One inbound delivery from an integration adapter
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Channel name as the upstream reports it
    pub channel: String,

    /// Raw source payload
    pub payload: String,

    /// When the upstream received the interaction (seconds since Unix epoch)
    pub received_at: u64,

    /// Pre-known actor classification, if the upstream has one
    pub actor_hint: Option<ActorType>,

    /// Upstream-supplied idempotency key
    pub dedup_key: String,
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
    /// Run the pipeline until the delivery channel closes or Ctrl+C arrives
    ///
    /// Per-delivery failures are logged and do not stop the worker; the
    /// interaction data behind them stays queryable in the store.
    pub async fn run(&self, mut deliveries: mpsc::Receiver<Delivery>) -> Result<(), HubError> {
        info!("Hub worker started");

        loop {
            tokio::select! {
                delivery = deliveries.recv() => {
                    match delivery {
                        Some(delivery) => self.handle(delivery).await,
                        None => {
                            info!("Delivery channel closed, stopping worker");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping worker");
                    break;
                }
            }
        }

        info!("Hub worker stopped. {}", self.feedback().summary());
        Ok(())
    }

    /// Drain the channel to completion without listening for signals
    ///
    /// Useful for tests and batch runs.
    pub async fn drain(&self, mut deliveries: mpsc::Receiver<Delivery>) -> Result<(), HubError> {
        while let Some(delivery) = deliveries.recv().await {
            self.handle(delivery).await;
        }
        Ok(())
    }

    async fn handle(&self, delivery: Delivery) {
        let outcome = self
            .process(
                &delivery.channel,
                &delivery.payload,
                delivery.received_at,
                delivery.actor_hint,
                &delivery.dedup_key,
            )
            .await;

        match outcome {
            Ok(outcome) => {
                info!(
                    interaction_id = %outcome.interaction_id,
                    disposition = ?outcome.disposition,
                    "Delivery processed"
                );
            }
            Err(e) => {
                error!(dedup_key = %delivery.dedup_key, error = %e, "Delivery failed");
            }
        }
    }
}

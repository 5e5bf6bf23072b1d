//! Retrying egress wrapper
//!
//! Wraps any `EgressPort` adapter with bounded retries and exponential
//! backoff. Exhausted retries raise an operational alert and surface
//! `EgressFailure` to the caller — an egress instruction is never silently
//! dropped.

use crate::{AlertSink, EgressPort, GatewayError, RoutingMetadata};
use concierge_domain::InteractionId;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default number of attempts per egress call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base backoff delay in milliseconds (doubles per attempt)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Egress wrapper with retry, backoff, and alerting
pub struct RetryingEgress<E, A>
where
    E: EgressPort,
    A: AlertSink,
{
    inner: Arc<E>,
    alerts: A,
    max_attempts: u32,
    base_delay: Duration,
}

impl<E, A> RetryingEgress<E, A>
where
    E: EgressPort + Send + Sync + 'static,
    E::Error: std::fmt::Display + Send,
    A: AlertSink,
{
    /// Wrap an egress adapter with the default retry policy
    pub fn new(inner: E, alerts: A) -> Self {
        Self {
            inner: Arc::new(inner),
            alerts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }

    /// Set the maximum number of attempts per call
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base backoff delay (doubles per attempt)
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Deliver a routed interaction, retrying transient failures
    pub async fn route(
        &self,
        interaction_id: InteractionId,
        destination: &str,
        metadata: &RoutingMetadata,
    ) -> Result<(), GatewayError> {
        let destination = destination.to_string();
        let metadata = metadata.clone();
        self.call("route", move |port| {
            port.route(interaction_id, &destination, &metadata)
        })
        .await
    }

    /// Suppress an interaction, retrying transient failures
    pub async fn suppress(&self, interaction_id: InteractionId) -> Result<(), GatewayError> {
        self.call("suppress", move |port| port.suppress(interaction_id))
            .await
    }

    /// Enqueue an interaction for review, retrying transient failures
    pub async fn enqueue_review(
        &self,
        interaction_id: InteractionId,
        queue: &str,
    ) -> Result<(), GatewayError> {
        let queue = queue.to_string();
        self.call("enqueue_review", move |port| {
            port.enqueue_review(interaction_id, &queue)
        })
        .await
    }

    /// Run one egress operation with retry and backoff
    async fn call<Op>(&self, operation: &'static str, op: Op) -> Result<(), GatewayError>
    where
        Op: Fn(&E) -> Result<(), E::Error> + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let inner = Arc::clone(&self.inner);
            let op = Arc::clone(&op);

            // Adapters may block on their transport
            let outcome = tokio::task::spawn_blocking(move || op(&inner))
                .await
                .map_err(|e| GatewayError::EgressFailure {
                    operation,
                    attempts: attempt,
                    detail: format!("task join error: {}", e),
                })?;

            match outcome {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %last_error,
                        "Egress attempt failed"
                    );
                    if attempt < self.max_attempts {
                        // Exponential backoff: base, 2x, 4x, ...
                        let delay = self.base_delay * 2u32.pow(attempt - 1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let message = format!(
            "Egress {} failed permanently after {} attempts: {}",
            operation, self.max_attempts, last_error
        );
        self.alerts.alert(&message);

        Err(GatewayError::EgressFailure {
            operation,
            attempts: self.max_attempts,
            detail: last_error,
        })
    }
}

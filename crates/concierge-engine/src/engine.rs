//! Core classifier engine implementation

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::strategies::{ActorClassifier, PriorityScorer, StrategyError, TicketClassifier};
use concierge_domain::traits::PrecisionSource;
use concierge_domain::{
    ActorType, ClassificationId, ClassificationResult, Confidence, Interaction, LabelCategory,
    Priority, TicketType,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The classifier engine orchestrates the three sub-classifier strategies
///
/// Holds no shared mutable state across calls beyond its read-only
/// configuration and the optional read path into feedback precision;
/// concurrent interactions classify in parallel safely.
pub struct ClassifierEngine<A, T, P>
where
    A: ActorClassifier,
    T: TicketClassifier,
    P: PriorityScorer,
{
    actor: Arc<A>,
    ticket: Arc<T>,
    priority: Arc<P>,
    config: EngineConfig,
}

impl<A, T, P> ClassifierEngine<A, T, P>
where
    A: ActorClassifier + Send + Sync + 'static,
    T: TicketClassifier + Send + Sync + 'static,
    P: PriorityScorer + Send + Sync + 'static,
{
    /// Create a new engine from its three strategies
    pub fn new(actor: A, ticket: T, priority: P, config: EngineConfig) -> Self {
        Self {
            actor: Arc::new(actor),
            ticket: Arc::new(ticket),
            priority: Arc::new(priority),
            config,
        }
    }

    /// Classify an interaction, producing the result at history position `seq`
    ///
    /// Re-running with an identical interaction and model version yields an
    /// equivalent result (same labels, same confidences), enabling safe
    /// retries. A failed strategy contributes "no signal" for its category;
    /// only when every strategy fails is `ClassificationUnavailable` raised.
    pub async fn classify<F: PrecisionSource>(
        &self,
        interaction: &Interaction,
        seq: u64,
        precision: Option<&F>,
    ) -> Result<ClassificationResult, EngineError> {
        info!(
            interaction_id = %interaction.id,
            channel = interaction.source_channel.as_str(),
            seq,
            "Classifying interaction"
        );

        let deadline = self.config.strategy_timeout();

        let actor_task = {
            let strategy = Arc::clone(&self.actor);
            let interaction = interaction.clone();
            run_strategy(deadline, "actor", move || strategy.score(&interaction))
        };
        let ticket_task = {
            let strategy = Arc::clone(&self.ticket);
            let interaction = interaction.clone();
            run_strategy(deadline, "ticket", move || strategy.score(&interaction))
        };
        let priority_task = {
            let strategy = Arc::clone(&self.priority);
            let interaction = interaction.clone();
            run_strategy(deadline, "priority", move || strategy.score(&interaction))
        };

        let (actor_scores, ticket_scores, priority_scores) =
            tokio::join!(actor_task, ticket_task, priority_task);

        if let (Err(a), Err(t), Err(p)) = (&actor_scores, &ticket_scores, &priority_scores) {
            return Err(EngineError::ClassificationUnavailable(format!(
                "actor: {}; ticket: {}; priority: {}",
                a, t, p
            )));
        }

        let (actor_type, actor_confidence) = select_label(
            actor_scores.unwrap_or_default(),
            LabelCategory::Actor,
            self.config.epsilon,
            precision,
            |label: &ActorType| label.as_str(),
            |label: &ActorType| label.is_specific(),
        )
        .unwrap_or((ActorType::Unknown, Confidence::ZERO));

        let (ticket_type, ticket_confidence) = select_label(
            ticket_scores.unwrap_or_default(),
            LabelCategory::Ticket,
            self.config.epsilon,
            precision,
            |label: &TicketType| label.as_str(),
            |label: &TicketType| label.is_specific(),
        )
        .unwrap_or((TicketType::Other, Confidence::ZERO));

        let (priority, priority_confidence) = select_label(
            priority_scores.unwrap_or_default(),
            LabelCategory::Priority,
            self.config.epsilon,
            precision,
            |label: &Priority| label.as_str(),
            |_: &Priority| true,
        )
        .unwrap_or((Priority::Normal, Confidence::ZERO));

        let classified_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let result = ClassificationResult {
            id: ClassificationId::new(),
            interaction_id: interaction.id,
            seq,
            actor_type,
            actor_confidence,
            ticket_type,
            ticket_confidence,
            priority,
            priority_confidence,
            model_version: self.config.model_version.clone(),
            classified_at,
        };

        debug!(
            interaction_id = %interaction.id,
            actor = actor_type.as_str(),
            ticket = ticket_type.as_str(),
            priority = priority.as_str(),
            "Classification complete"
        );

        Ok(result)
    }
}

/// Run one strategy on the blocking pool, bounded by the deadline
async fn run_strategy<L, Fst>(
    deadline: std::time::Duration,
    name: &'static str,
    task: Fst,
) -> Result<Vec<(L, Confidence)>, String>
where
    L: Send + 'static,
    Fst: FnOnce() -> Result<Vec<(L, Confidence)>, StrategyError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);

    match timeout(deadline, handle).await {
        Err(_) => {
            warn!(strategy = name, "Strategy timed out");
            Err(format!("{} strategy timed out", name))
        }
        Ok(Err(join_err)) => Err(format!("{} strategy task error: {}", name, join_err)),
        Ok(Ok(Err(e))) => {
            warn!(strategy = name, error = %e, "Strategy failed");
            Err(e.to_string())
        }
        Ok(Ok(Ok(candidates))) => Ok(candidates),
    }
}

/// Select the winning label from scored candidates
///
/// The top scorer wins outright unless other candidates land within
/// `epsilon` of it. Near-ties prefer the label with higher historical
/// precision; with no history, the more specific label wins. The selected
/// label keeps its own confidence.
fn select_label<L: Copy, F: PrecisionSource>(
    candidates: Vec<(L, Confidence)>,
    category: LabelCategory,
    epsilon: f64,
    precision: Option<&F>,
    label_str: fn(&L) -> &'static str,
    is_specific: fn(&L) -> bool,
) -> Option<(L, Confidence)> {
    let top = candidates
        .iter()
        .map(|(_, c)| *c)
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))?;

    let contenders: Vec<&(L, Confidence)> = candidates
        .iter()
        .filter(|(_, c)| c.within_epsilon(top, epsilon))
        .collect();

    if contenders.len() == 1 {
        return Some(*contenders[0]);
    }

    // Near-tie: consult historical precision first
    if let Some(source) = precision {
        let with_history: Vec<(&(L, Confidence), f64)> = contenders
            .iter()
            .filter_map(|cand| {
                source
                    .precision(category, label_str(&cand.0))
                    .map(|p| (*cand, p))
            })
            .collect();

        if let Some((winner, _)) = with_history.iter().max_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        }) {
            return Some(**winner);
        }
    }

    // No history: prefer specific labels over catch-alls
    let specific: Vec<&&(L, Confidence)> = contenders
        .iter()
        .filter(|(label, _)| is_specific(label))
        .collect();

    let pool = if specific.is_empty() {
        contenders.iter().collect::<Vec<_>>()
    } else {
        specific
    };

    pool.into_iter()
        .max_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|cand| **cand)
}

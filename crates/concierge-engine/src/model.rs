//! Model-delegated strategies
//!
//! Delegates a classification axis to an external model behind the
//! `ModelProvider` trait. The prompt names the allowed labels; the model
//! answers with a JSON verdict (`{"label": ..., "confidence": ...}`),
//! sometimes wrapped in a markdown code fence, which is tolerated.
//!
//! The engine bounds these calls with its strategy timeout; a failed or
//! malformed verdict degrades this strategy to "no signal" without
//! affecting the other axes.

use crate::strategies::{StrategyError, TicketClassifier};
use concierge_domain::traits::ModelProvider;
use concierge_domain::{Confidence, Interaction, TicketType};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors parsing a model verdict
#[derive(Error, Debug)]
pub enum VerdictParseError {
    /// Response was not valid JSON
    #[error("JSON parse error: {0}")]
    Json(String),

    /// Response was missing a required field
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The model answered with a label outside the allowed set
    #[error("Unknown label: {0}")]
    UnknownLabel(String),
}

/// Build a classification prompt for one axis
fn build_prompt(text: &str, axis: &str, labels: &[&str]) -> String {
    format!(
        "Classify the following customer interaction by {axis}.\n\
         Allowed labels: {labels}.\n\
         Respond with JSON only: {{\"label\": \"<label>\", \"confidence\": <0..1>}}\n\n\
         Interaction:\n{text}",
        axis = axis,
        labels = labels.join(", "),
        text = text,
    )
}

/// Extract JSON from a response, handling markdown code fences
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let without_open = match trimmed.find('\n') {
            Some(pos) => &trimmed[pos + 1..],
            None => return trimmed,
        };
        match without_open.rfind("```") {
            Some(pos) => without_open[..pos].trim(),
            None => without_open.trim(),
        }
    } else {
        trimmed
    }
}

/// Parse a `{"label": ..., "confidence": ...}` verdict
pub fn parse_verdict(response: &str) -> Result<(String, Confidence), VerdictParseError> {
    let json: serde_json::Value = serde_json::from_str(extract_json(response))
        .map_err(|e| VerdictParseError::Json(e.to_string()))?;

    let label = json
        .get("label")
        .and_then(|v| v.as_str())
        .ok_or(VerdictParseError::MissingField("label"))?
        .to_string();

    let confidence = json
        .get("confidence")
        .and_then(|v| v.as_f64())
        .ok_or(VerdictParseError::MissingField("confidence"))?;

    Ok((label, Confidence::clamped(confidence)))
}

/// Ticket classifier that delegates to an external model
pub struct ModelTicketClassifier<P: ModelProvider> {
    provider: Arc<P>,
}

impl<P: ModelProvider> ModelTicketClassifier<P> {
    /// Create a new model-delegated ticket classifier
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

impl<P> TicketClassifier for ModelTicketClassifier<P>
where
    P: ModelProvider,
    P::Error: std::fmt::Display,
{
    fn score(
        &self,
        interaction: &Interaction,
    ) -> Result<Vec<(TicketType, Confidence)>, StrategyError> {
        let labels: Vec<&str> = TicketType::all().iter().map(|t| t.as_str()).collect();
        let prompt = build_prompt(&interaction.normalized_text, "ticket type", &labels);

        let response = self
            .provider
            .generate(&prompt)
            .map_err(|e| StrategyError::Unavailable(e.to_string()))?;

        let (label, confidence) =
            parse_verdict(&response).map_err(|e| StrategyError::InvalidOutput(e.to_string()))?;

        let ticket_type = match TicketType::parse(&label) {
            Some(t) => t,
            None => {
                warn!(label = %label, "Model answered with unknown ticket label");
                return Err(StrategyError::InvalidOutput(
                    VerdictParseError::UnknownLabel(label).to_string(),
                ));
            }
        };

        Ok(vec![(ticket_type, confidence)])
    }

    fn name(&self) -> &str {
        "model-ticket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_domain::SourceChannel;
    use concierge_llm::MockProvider;

    fn interaction(text: &str) -> Interaction {
        Interaction::new(
            SourceChannel::Chat,
            text.to_string(),
            text.to_string(),
            1_700_000_000,
            None,
        )
    }

    #[test]
    fn test_parse_verdict_plain_json() {
        let (label, confidence) =
            parse_verdict(r#"{"label": "refund", "confidence": 0.92}"#).unwrap();
        assert_eq!(label, "refund");
        assert_eq!(confidence.value(), 0.92);
    }

    #[test]
    fn test_parse_verdict_fenced_json() {
        let response = "```json\n{\"label\": \"spam\", \"confidence\": 0.99}\n```";
        let (label, confidence) = parse_verdict(response).unwrap();
        assert_eq!(label, "spam");
        assert_eq!(confidence.value(), 0.99);
    }

    #[test]
    fn test_parse_verdict_clamps_out_of_range_confidence() {
        let (_, confidence) = parse_verdict(r#"{"label": "other", "confidence": 1.4}"#).unwrap();
        assert_eq!(confidence.value(), 1.0);
    }

    #[test]
    fn test_parse_verdict_rejects_garbage() {
        assert!(parse_verdict("not json at all").is_err());
        assert!(parse_verdict(r#"{"confidence": 0.5}"#).is_err());
        assert!(parse_verdict(r#"{"label": "refund"}"#).is_err());
    }

    #[test]
    fn test_model_classifier_happy_path() {
        let provider = MockProvider::new(r#"{"label": "cancellation", "confidence": 0.88}"#);
        let classifier = ModelTicketClassifier::new(provider);

        let scores = classifier
            .score(&interaction("please close my account"))
            .unwrap();
        assert_eq!(
            scores,
            vec![(TicketType::Cancellation, Confidence::new(0.88))]
        );
    }

    #[test]
    fn test_model_classifier_unknown_label() {
        let provider = MockProvider::new(r#"{"label": "haircut", "confidence": 0.9}"#);
        let classifier = ModelTicketClassifier::new(provider);

        let result = classifier.score(&interaction("anything"));
        assert!(matches!(result, Err(StrategyError::InvalidOutput(_))));
    }

    #[test]
    fn test_model_classifier_provider_failure() {
        let classifier = ModelTicketClassifier::new(MockProvider::always_failing());

        let result = classifier.score(&interaction("anything"));
        assert!(matches!(result, Err(StrategyError::Unavailable(_))));
    }
}

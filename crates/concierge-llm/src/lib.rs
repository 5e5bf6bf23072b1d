//! Concierge Model Provider Layer
//!
//! Pluggable classification model providers.
//!
//! # Architecture
//!
//! This crate provides implementations of the `ModelProvider` trait from
//! `concierge-domain`. The classifier engine is agnostic to which model or
//! vendor answers a classification prompt; providers here supply the
//! transport, and the engine supplies the prompt, timeout, and parsing.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `HttpProvider`: Generic HTTP model endpoint integration
//!
//! # Examples
//!
//! ```
//! use concierge_llm::MockProvider;
//! use concierge_domain::traits::ModelProvider;
//!
//! let provider = MockProvider::new(r#"{"label":"refund","confidence":0.9}"#);
//! let result = provider.generate("classify this").unwrap();
//! assert!(result.contains("refund"));
//! ```

#![warn(missing_docs)]

pub mod http;

use concierge_domain::traits::ModelProvider as ModelProviderTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use http::HttpProvider;

/// Errors that can occur during model operations
#[derive(Error, Debug)]
pub enum ModelError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the model
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available at the endpoint
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("Model error: {0}")]
    Other(String),
}

/// Mock model provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
///
/// # Examples
///
/// ```
/// use concierge_llm::MockProvider;
/// use concierge_domain::traits::ModelProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("fixed");
/// assert_eq!(provider.generate("any prompt").unwrap(), "fixed");
///
/// // Per-prompt responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), response.into());
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), "ERROR".to_string());
    }

    /// Create a provider that fails for every prompt
    ///
    /// Useful for exercising `ClassificationUnavailable` paths.
    pub fn always_failing() -> Self {
        Self::new("ERROR")
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl ModelProviderTrait for MockProvider {
    type Error = ModelError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        let responses = self.responses.lock().unwrap();
        let response = responses
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());

        if response == "ERROR" {
            return Err(ModelError::Other("Mock error".to_string()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt");
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("foo").unwrap(), "bar");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate("bad prompt");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ModelError::Other(_)));
    }

    #[test]
    fn test_always_failing_provider() {
        let provider = MockProvider::always_failing();
        assert!(provider.generate("anything").is_err());
        assert!(provider.generate("anything else").is_err());
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();

        // Both should share the same call count due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}

//! HTTP Model Provider Implementation
//!
//! Provides integration with a generic HTTP classification model endpoint.
//! Any service that accepts a prompt and returns a completion can sit behind
//! this provider; the classifier engine never learns which vendor answered.
//!
//! # Features
//!
//! - Async HTTP communication with the model API
//! - Configurable endpoint and model
//! - Retry logic with exponential backoff
//! - Timeout handling

use crate::ModelError;
use concierge_domain::traits::ModelProvider as ModelProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for model requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP model API provider
///
/// Communicates with a remote classification model over HTTP. Transient
/// failures are retried with exponential backoff; exhausted retries surface
/// the last error so the engine can degrade the strategy.
pub struct HttpProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for the generate API
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from the generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl HttpProvider {
    /// Create a new HTTP provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: model API endpoint (e.g., "http://localhost:11434")
    /// - `model`: model identifier the endpoint understands
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ModelError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate a completion using the model API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The endpoint is unreachable
    /// - The model is not available
    /// - The response format is invalid
    /// - All retry attempts are exhausted
    pub async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        // Retry logic with exponential backoff
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        match response.json::<GenerateResponse>().await {
                            Ok(model_response) => {
                                return Ok(model_response.response);
                            }
                            Err(e) => {
                                return Err(ModelError::InvalidResponse(format!(
                                    "Failed to parse response: {}",
                                    e
                                )));
                            }
                        }
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(ModelError::ModelNotAvailable(self.model.clone()));
                    } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ModelError::RateLimitExceeded);
                    } else {
                        let status = response.status();
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        last_error = Some(ModelError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(ModelError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, etc.
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| ModelError::Communication("Max retries exceeded".to_string())))
    }
}

impl ModelProviderTrait for HttpProvider {
    type Error = ModelError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        // Blocking wrapper for async function; callers run this inside
        // spawn_blocking with their own deadline
        tokio::runtime::Runtime::new()
            .map_err(|e| ModelError::Other(format!("Runtime error: {}", e)))?
            .block_on(async { self.generate(prompt).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_provider_creation() {
        let provider = HttpProvider::new("http://localhost:11434", "llama2").unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model, "llama2");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_http_provider_with_max_retries() {
        let provider = HttpProvider::new("http://localhost:11434", "llama2")
            .unwrap()
            .with_max_retries(5);
        assert_eq!(provider.max_retries, 5);
    }

    #[tokio::test]
    async fn test_http_error_handling() {
        // Unroutable endpoint triggers a communication error
        let provider = HttpProvider::new("http://localhost:1", "llama2")
            .unwrap()
            .with_max_retries(1);

        let result = provider.generate("test").await;
        assert!(result.is_err());

        match result {
            Err(ModelError::Communication(_)) => {} // Expected
            other => panic!("Expected Communication error, got {:?}", other.err()),
        }
    }
}

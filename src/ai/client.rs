//! Text Model REST API Client
//!
//! HTTP client for the hosted generative-text API. Every writing tool goes
//! through `generate`; the client owns timeouts, retries and the error
//! taxonomy so callers only see `ModelError`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text model API client
pub struct TextModelClient {
    client: Client,
    config: TextModelConfig,
}

/// Configuration for the text model client
#[derive(Debug, Clone)]
pub struct TextModelConfig {
    /// Base URL for the model API (e.g., "http://localhost:8090")
    pub base_url: String,
    /// API key, sent as a query parameter when non-empty
    pub api_key: String,
    /// Model identifier used in the request path
    pub model: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum retry attempts
    pub max_retries: u32,
}

impl Default for TextModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            api_key: String::new(),
            model: "text-001".to_string(),
            request_timeout_ms: 15000,
            max_retries: 3,
        }
    }
}

impl TextModelClient {
    /// Create a new client with the given configuration
    pub fn new(config: TextModelConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &TextModelConfig {
        &self.config
    }

    /// Endpoint for the configured model
    fn endpoint(&self) -> String {
        let mut url = format!(
            "{}/v1/models/{}:generate",
            self.config.base_url, self.config.model
        );
        if !self.config.api_key.is_empty() {
            url = format!("{}?key={}", url, self.config.api_key);
        }
        url
    }

    /// Check if the model API is reachable
    pub async fn health_check(&self) -> Result<(), ModelError> {
        let url = format!("{}/health", self.config.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout
            } else if e.is_connect() {
                ModelError::Unavailable
            } else {
                ModelError::Request(e)
            }
        })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ModelError::Unavailable)
        }
    }

    /// Generate text for a prompt, with retry logic
    pub async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = self.endpoint();
        let body = GenerateRequest {
            prompt: prompt.to_string(),
        };

        let mut last_error = ModelError::Unavailable;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 4s, 9s...
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            match self.client.post(&url).json(&body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let result: GenerateResponse =
                            response.json().await.map_err(ModelError::Request)?;

                        let output = result
                            .candidates
                            .into_iter()
                            .next()
                            .map(|c| c.output)
                            .unwrap_or_default();

                        if output.trim().is_empty() {
                            return Err(ModelError::EmptyResponse);
                        }
                        return Ok(output);
                    } else if response.status().as_u16() == 429 {
                        // Rate limited - check Retry-After header
                        if let Some(retry_after) = response.headers().get("Retry-After") {
                            if let Ok(secs) = retry_after.to_str().unwrap_or("5").parse::<u64>() {
                                tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
                            }
                        }
                        last_error = ModelError::RateLimited;
                        continue;
                    } else {
                        let status = response.status();
                        let text = response.text().await.unwrap_or_default();
                        return Err(ModelError::Api {
                            status: status.as_u16(),
                            message: text,
                        });
                    }
                }
                Err(e) => {
                    last_error = if e.is_timeout() {
                        ModelError::Timeout
                    } else if e.is_connect() {
                        ModelError::Unavailable
                    } else {
                        ModelError::Request(e)
                    };
                    continue;
                }
            }
        }

        Err(last_error)
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    output: String,
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when communicating with the model API
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model API unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Model returned an empty response")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TextModelConfig::default();
        assert_eq!(config.base_url, "http://localhost:8090");
        assert_eq!(config.model, "text-001");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_endpoint_without_key() {
        let client = TextModelClient::new(TextModelConfig::default());
        assert_eq!(
            client.endpoint(),
            "http://localhost:8090/v1/models/text-001:generate"
        );
    }

    #[test]
    fn test_endpoint_with_key() {
        let config = TextModelConfig {
            api_key: "secret".to_string(),
            ..Default::default()
        };
        let client = TextModelClient::new(config);
        assert!(client.endpoint().ends_with(":generate?key=secret"));
    }

    #[test]
    fn test_generate_response_tolerates_missing_fields() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());

        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"output": "hello"}]}"#).unwrap();
        assert_eq!(parsed.candidates[0].output, "hello");
    }
}

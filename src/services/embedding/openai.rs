//! OpenAI-compatible `/embeddings` backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, EmbeddingModel};

/// Request body for the /embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: &'a str,
    model: &'a str,
    encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Response from the /embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for OpenAI-compatible embedding APIs.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: EmbeddingModel,
    dimensions: Option<usize>,
}

impl OpenAiProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: &EmbeddingConfig, api_key: String) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        // Only shortenable models accept the `dimensions` parameter
        let dimensions = config
            .dimensions
            .filter(|_| config.model.supports_dimension_override());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model,
            dimensions,
        })
    }

    async fn error_from_response(response: reqwest::Response) -> EmbeddingError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        match status {
            StatusCode::TOO_MANY_REQUESTS => EmbeddingError::RateLimited { retry_after },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                EmbeddingError::Unauthorized(message)
            }
            _ => EmbeddingError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            input: text,
            model: self.model.id(),
            encoding_format: "float",
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::ConnectionError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    fn model(&self) -> &str {
        self.model.id()
    }

    fn dimension(&self) -> usize {
        self.dimensions
            .unwrap_or_else(|| self.model.native_dimension())
    }
}

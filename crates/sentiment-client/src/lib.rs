//! HTTP client for the FinBERT sentiment service.
//!
//! The classifier runs out of process (a tone-tuned FinBERT model behind a
//! small HTTP API); this client exposes it through the
//! [`SentimentClassifier`] capability so tests can substitute a mock.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sentiment_core::{ClassificationError, Sentiment, SentimentClassifier, SentimentLabel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
struct PredictRequest {
    texts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct PredictResponse {
    predictions: Vec<Prediction>,
}

#[derive(Clone)]
pub struct FinbertClient {
    client: reqwest::Client,
    base_url: String,
}

impl FinbertClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, base_url }
    }

    async fn predict(&self, texts: Vec<String>) -> Result<Vec<Sentiment>, ClassificationError> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { texts })
            .send()
            .await
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "sentiment service rejected request");
            return Err(ClassificationError::ServiceUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::InvalidResponse(e.to_string()))?;

        tracing::debug!(predictions = parsed.predictions.len(), "scored texts");

        parsed
            .predictions
            .into_iter()
            .map(|p| {
                let label = SentimentLabel::from_str(&p.label)
                    .map_err(ClassificationError::InvalidResponse)?;
                Ok(Sentiment {
                    label,
                    score: p.score,
                })
            })
            .collect()
    }

    /// Check service health.
    pub async fn health(&self) -> Result<bool, ClassificationError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl SentimentClassifier for FinbertClient {
    async fn classify(&self, text: &str) -> Result<Sentiment, ClassificationError> {
        let mut results = self.predict(vec![text.to_string()]).await?;
        results.pop().ok_or_else(|| {
            ClassificationError::InvalidResponse("empty prediction list".to_string())
        })
    }
}

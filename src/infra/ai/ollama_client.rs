// =============================================================================
// OLLAMA CLIENT - Local LLM toxicity classification
// =============================================================================
//
// This module provides an implementation of the `ToxicityClassifier` trait
// that asks a locally-hosted Ollama server to score review text.
//
// **Wire contract:**
// - Request: `POST {base_url}/api/generate` with `stream: false`.
// - Response: the model's answer is a string at `response`. We ask the model
//   to answer with a JSON object and cut it out of that string (first `{` to
//   last `}`), since models like to wrap JSON in prose.
//
// **Failure handling:**
// Every failure (connect error, timeout, non-2xx, unreadable answer) becomes
// `ClassifierError::Unavailable`. The client never retries.
//
// **Environment Variables:**
// - `OLLAMA_URL` - Base URL (default `http://localhost:11434`)
// - `OLLAMA_MODEL` - Model name (default `llama3`)
// - `OLLAMA_TIMEOUT_SECS` - Per-call timeout (default 10)

use crate::core::moderation::{Classification, ClassifierError, ToxicityClassifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the classification service.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

// =============================================================================
// OLLAMA API DATA STRUCTURES
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// The JSON object the prompt asks the model to produce.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    toxicity_score: f64,
    #[serde(default)]
    reason: Option<String>,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct OllamaClient {
    client: Client,
    config: ClassifierConfig,
}

impl OllamaClient {
    pub fn new(config: ClassifierConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    fn build_prompt(text: &str) -> String {
        format!(
            r#"You are an expert content moderator. Analyze the following movie review and decide whether it contains:
- Offensive, abusive or hateful language
- Insults, threats or harassment
- Content inappropriate for a movie site

Text to analyze: "{}"

Reply ONLY with JSON in exactly this format:
{{"toxicity_score": <number between 0.0 and 1.0, 1.0 = most toxic>, "is_toxic": <true/false>, "reason": "<short explanation>"}}"#,
            text
        )
    }

    /// Extract the verdict from the model's free-form answer.
    fn parse_answer(answer: &str) -> Result<Classification, ClassifierError> {
        let start = answer.find('{');
        let end = answer.rfind('}');
        let json = match (start, end) {
            (Some(start), Some(end)) if end > start => &answer[start..=end],
            _ => {
                return Err(ClassifierError::Unavailable(
                    "no JSON object in model answer".to_string(),
                ))
            }
        };

        let verdict: ModelVerdict = serde_json::from_str(json).map_err(|e| {
            ClassifierError::Unavailable(format!("unreadable model verdict: {}", e))
        })?;

        Ok(Classification {
            toxicity_score: verdict.toxicity_score.clamp(0.0, 1.0),
            reason: verdict
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "No reason given".to_string()),
        })
    }
}

#[async_trait]
impl ToxicityClassifier for OllamaClient {
    async fn analyze(&self, text: &str) -> Result<Classification, ClassifierError> {
        let url = self.generate_url();
        let payload = GenerateRequest {
            model: &self.config.model,
            prompt: Self::build_prompt(text),
            stream: false,
            options: GenerateOptions {
                temperature: 0.1,
                top_p: 0.9,
                num_predict: 200,
            },
        };

        tracing::debug!(url = %url, "Sending classification request");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "request failed" };
                ClassifierError::Unavailable(format!("{}: {}", kind, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ClassifierError::Unavailable(format!(
                "Ollama API error: {}",
                status
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("unreadable response: {}", e)))?;

        let classification = Self::parse_answer(&body.response)?;
        tracing::debug!(
            score = classification.toxicity_score,
            reason = %classification.reason,
            "Classification complete"
        );
        Ok(classification)
    }
}

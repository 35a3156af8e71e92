use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use super::{GeneratorContext, NarrativeGenerator, ensure_success, transport_error};
use crate::error::GenerationError;

/// Gemini generateContent 客户端
pub struct GeminiGenerator {
    context: Arc<GeneratorContext>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiGenerator {
    pub fn new(context: Arc<GeneratorContext>) -> Self {
        Self { context }
    }

    async fn exchange(&self, prompt: &str) -> Result<String, GenerationError> {
        let config = self.context.config();
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: self.context.system_instruction(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: config
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let response = self
            .context
            .client()
            .post(
                self.context
                    .endpoint(&format!("models/{}:generateContent", config.model)),
            )
            .header("x-goog-api-key", &config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let body: GenerateContentResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::malformed(
                "generator returned no candidate text",
                &text,
            ));
        }

        Ok(text)
    }
}

#[async_trait]
impl NarrativeGenerator for GeminiGenerator {
    #[instrument(skip(self, prompt), fields(backend = "gemini"))]
    async fn send(&self, conversation_id: &str, prompt: &str) -> Result<String, GenerationError> {
        let started = Instant::now();
        let text = self.context.within_deadline(self.exchange(prompt)).await?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_len = text.len(),
            "gemini exchange completed"
        );
        Ok(text)
    }
}

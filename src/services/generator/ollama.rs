use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use super::{GeneratorContext, NarrativeGenerator, ensure_success, transport_error};
use crate::error::GenerationError;

/// Ollama /api/chat 客户端（本地模型）
pub struct OllamaGenerator {
    context: Arc<GeneratorContext>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaGenerator {
    pub fn new(context: Arc<GeneratorContext>) -> Self {
        Self { context }
    }

    async fn exchange(&self, prompt: &str) -> Result<String, GenerationError> {
        let config = self.context.config();
        let request = ChatRequest {
            model: &config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: self.context.system_instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            format: "json",
            options: config
                .temperature
                .map(|temperature| ChatOptions { temperature }),
        };

        let response = self
            .context
            .client()
            .post(self.context.endpoint("api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let body: ChatResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        let text = body.message.map(|m| m.content).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::malformed(
                "generator returned an empty message",
                &text,
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl NarrativeGenerator for OllamaGenerator {
    #[instrument(skip(self, prompt), fields(backend = "ollama"))]
    async fn send(&self, conversation_id: &str, prompt: &str) -> Result<String, GenerationError> {
        let started = Instant::now();
        let text = self.context.within_deadline(self.exchange(prompt)).await?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_len = text.len(),
            "ollama exchange completed"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generator::test_support::context;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_chat_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "stream": false,
                "format": "json"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "{\"location\": \"Fen\"}"},
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(context("ollama", &server.uri(), 5));
        let text = generator.send("conv-1", "Begin").await.unwrap();
        assert_eq!(text, "{\"location\": \"Fen\"}");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Begin");
    }

    #[tokio::test]
    async fn test_not_found_model_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"error":"model not found"}"#),
            )
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(context("ollama", &server.uri(), 5));
        assert!(matches!(
            generator.send("conv-1", "Begin").await,
            Err(GenerationError::Unavailable(_))
        ));
    }
}

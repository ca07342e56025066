//! Ollama LLM provider for local model inference.
//!
//! Talks to a local Ollama instance via its HTTP API.
//! Models are preloaded and unloaded through `keep_alive`.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Ollama provider bound to a single model.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// `/api/generate` with no prompt only (un)loads the model.
    async fn keep_alive(&self, keep_alive: Option<i64>) -> Result<(), PipelineError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = KeepAliveRequest {
            model: &self.model,
            keep_alive,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PipelineError::Llm {
                message: format!("Ollama request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Llm {
                message: format!("Ollama HTTP {status} for model {}: {text}", self.model),
                status_code: Some(status.as_u16()),
            });
        }
        Ok(())
    }
}

/// Ollama /api/chat request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<&'a str>,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Ollama /api/chat response.
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct KeepAliveRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<i64>,
}

fn chat_body<'a>(model: &'a str, request: &'a LlmRequest) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: &request.prompt,
            images: request
                .image
                .as_ref()
                .map(|img| vec![img.data.as_str()])
                .unwrap_or_default(),
        }],
        stream: false,
        options: request.temperature.map(|temperature| ChatOptions { temperature }),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn load(&self) -> Result<(), PipelineError> {
        tracing::debug!("Loading Ollama model {}", self.model);
        self.keep_alive(None).await
    }

    async fn unload(&self) -> Result<(), PipelineError> {
        tracing::debug!("Unloading Ollama model {}", self.model);
        self.keep_alive(Some(0)).await
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, PipelineError> {
        let url = format!("{}/api/chat", self.endpoint);
        let start = Instant::now();

        let resp = self
            .client
            .post(&url)
            .json(&chat_body(&self.model, request))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PipelineError::Llm {
                message: format!("Ollama request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Llm {
                message: format!("Ollama HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let chat: ChatResponse = resp.json().await.map_err(|e| PipelineError::Llm {
            message: format!("Failed to parse Ollama response: {e}"),
            status_code: None,
        })?;

        Ok(LlmResponse {
            text: chat.message.content,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let provider =
            OllamaProvider::new("http://localhost:11434/", "llava:34b", Duration::from_secs(5));
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model(), "llava:34b");
    }

    #[test]
    fn test_chat_body_with_image() {
        let image = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg");
        let request = LlmRequest::describe_image(image, "Describe the image.");
        let json = serde_json::to_value(chat_body("llava:34b", &request)).unwrap();

        assert_eq!(json["model"], "llava:34b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Describe the image.");
        assert_eq!(json["messages"][0]["images"][0], "/9j/");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_chat_body_text_only_omits_images() {
        let request = LlmRequest::extract_keywords("List objects.", "A cup.");
        let json = serde_json::to_value(chat_body("deepseek-r1:14b", &request)).unwrap();
        assert!(json["messages"][0].get("images").is_none());
        assert_eq!(json["options"]["temperature"], 0.0);
    }

    #[test]
    fn test_chat_response_parse() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"model":"llava:34b","message":{"role":"assistant","content":"A desk."},"done":true}"#,
        )
        .unwrap();
        assert_eq!(resp.message.content, "A desk.");
    }

    #[test]
    fn test_keep_alive_body() {
        let unload = serde_json::to_value(KeepAliveRequest {
            model: "llava:34b",
            keep_alive: Some(0),
        })
        .unwrap();
        assert_eq!(unload["keep_alive"], 0);

        let load = serde_json::to_value(KeepAliveRequest {
            model: "llava:34b",
            keep_alive: None,
        })
        .unwrap();
        assert!(load.get("keep_alive").is_none());
    }
}

//! AI backend abstraction.
//!
//! Supports two backends:
//! - Local: Ollama (default)
//! - Remote: Gemini (feature-flagged)

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiConfig;

use super::AdviceError;

/// A message in a conversation with the AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Request to the AI backend.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from the AI backend.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub tokens_used: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for AI backends.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AdviceError>;

    /// Check if the backend is available.
    async fn health_check(&self) -> Result<bool, AdviceError>;
}

/// Build the backend named in config.
///
/// `base_url` only applies to Ollama; the Gemini endpoint is fixed and
/// its key is read from the environment variable named in config.
pub fn create_backend(config: &AiConfig) -> Result<Arc<dyn AiBackend>, AdviceError> {
    match config.backend.as_str() {
        "ollama" => Ok(Arc::new(OllamaBackend::new(
            config.base_url.clone(),
            config.model.clone(),
            config.timeout_seconds,
        ))),
        #[cfg(feature = "remote-ai")]
        "gemini" => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                AdviceError::BackendUnavailable(format!(
                    "{} env var not set",
                    config.api_key_env
                ))
            })?;
            Ok(Arc::new(GeminiBackend::new(
                api_key,
                config.model.clone(),
                config.timeout_seconds,
            )))
        }
        #[cfg(not(feature = "remote-ai"))]
        "gemini" => Err(AdviceError::BackendUnavailable(
            "gemini backend requires building with the remote-ai feature".to_string(),
        )),
        other => Err(AdviceError::BackendUnavailable(format!(
            "unknown AI backend '{other}'"
        ))),
    }
}

/// Ollama backend implementation.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            model,
        }
    }
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Default)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl AiBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AdviceError> {
        let url = format!("{}/api/chat", self.base_url);

        let messages: Vec<OllamaMessage> = request
            .messages
            .into_iter()
            .map(|m| OllamaMessage {
                role: match m.role {
                    MessageRole::System => "system".to_string(),
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                },
                content: m.content,
            })
            .collect();

        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!("Sending request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AdviceError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdviceError::BackendUnavailable(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AdviceError::ResponseParseError(e.to_string()))?;

        let tokens_used = match (
            ollama_response.prompt_eval_count,
            ollama_response.eval_count,
        ) {
            (Some(prompt), Some(completion)) => Some(TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        Ok(ChatResponse {
            content: ollama_response.message.content,
            model: ollama_response.model,
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool, AdviceError> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// --- Gemini backend ---

#[cfg(feature = "remote-ai")]
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion", default)]
    model_version: Option<String>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

/// Gemini API backend implementation.
#[cfg(feature = "remote-ai")]
pub struct GeminiBackend {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[cfg(feature = "remote-ai")]
impl GeminiBackend {
    pub fn new(api_key: String, model: String, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            model,
            api_key,
        }
    }
}

#[cfg(feature = "remote-ai")]
#[async_trait]
impl AiBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AdviceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            GEMINI_API_BASE, self.model
        );

        // Gemma-class models reject systemInstruction, so system text is
        // folded into the first user turn instead.
        let mut system_parts: Vec<String> = Vec::new();
        let mut contents: Vec<GeminiContent> = Vec::new();

        for msg in request.messages {
            match msg.role {
                MessageRole::System => system_parts.push(msg.content),
                MessageRole::User => {
                    let text = if system_parts.is_empty() {
                        msg.content
                    } else {
                        let folded = format!("{}\n\n{}", system_parts.join("\n\n"), msg.content);
                        system_parts.clear();
                        folded
                    };
                    contents.push(GeminiContent {
                        role: "user".to_string(),
                        parts: vec![GeminiPart { text }],
                    });
                }
                MessageRole::Assistant => {
                    contents.push(GeminiContent {
                        role: "model".to_string(),
                        parts: vec![GeminiPart { text: msg.content }],
                    });
                }
            }
        }

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        let gemini_request = GeminiRequest {
            contents,
            generation_config,
        };

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| AdviceError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdviceError::BackendUnavailable(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AdviceError::ResponseParseError(e.to_string()))?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| {
                AdviceError::ResponseParseError("Gemini returned no candidates".to_string())
            })?;

        let content = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        let tokens_used = gemini_response.usage_metadata.map(|usage| TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.prompt_token_count + usage.candidates_token_count,
        });

        Ok(ChatResponse {
            content,
            model: gemini_response
                .model_version
                .unwrap_or_else(|| self.model.clone()),
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool, AdviceError> {
        // No cheap health endpoint; assume available while a key is set.
        Ok(true)
    }
}

/// Mock backend for testing.
#[cfg(test)]
pub struct MockBackend {
    response: Option<String>,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    /// A backend that fails every chat call.
    pub fn unavailable() -> Self {
        Self { response: None }
    }
}

#[cfg(test)]
#[async_trait]
impl AiBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, AdviceError> {
        match &self.response {
            Some(text) => Ok(ChatResponse {
                content: text.clone(),
                model: "mock".to_string(),
                tokens_used: None,
            }),
            None => Err(AdviceError::BackendUnavailable(
                "mock backend is down".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<bool, AdviceError> {
        Ok(self.response.is_some())
    }
}

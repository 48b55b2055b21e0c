//! Narrative sleep advice.
//!
//! Turns the two aggregated stat views into a free-text coaching note
//! via a pluggable AI backend. Generation is slow and non-deterministic
//! by nature; nothing here participates in record or stats invariants,
//! and a failed or empty generation never touches stored data.

pub mod backend;

pub use backend::{
    create_backend, AiBackend, ChatMessage, ChatRequest, ChatResponse, OllamaBackend, TokenUsage,
};

#[cfg(feature = "remote-ai")]
pub use backend::GeminiBackend;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::models::{DailyStat, WeekdayAverage};

/// Errors that can occur during advice generation.
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("AI backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Failed to parse AI response: {0}")]
    ResponseParseError(String),

    #[error("AI backend returned an empty message")]
    EmptyResponse,

    #[error("Failed to encode stats payload: {0}")]
    PayloadEncode(#[from] serde_json::Error),
}

const SYSTEM_PROMPT: &str = "You are a supportive sleep coach. You are given a user's sleep \
log as JSON: a recent daily series and per-weekday averages, with durations in hours. Point \
out patterns worth attention and give a few concrete, actionable suggestions. Keep it short \
and plain.";

/// Generates sleep advice from aggregated statistics.
#[derive(Clone)]
pub struct SleepAdvisor {
    backend: Arc<dyn AiBackend>,
}

impl SleepAdvisor {
    pub fn new(backend: Arc<dyn AiBackend>) -> Self {
        Self { backend }
    }

    /// Backend name, for logging and diagnostics.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Probe whether the configured backend is reachable.
    pub async fn health_check(&self) -> Result<bool, AdviceError> {
        self.backend.health_check().await
    }

    /// One-shot advice generation. Bounded by the backend's own request
    /// timeout; no retries.
    pub async fn advise(
        &self,
        recent: &[DailyStat],
        weekday: &[WeekdayAverage],
    ) -> Result<String, AdviceError> {
        let prompt = build_prompt(recent, weekday)?;

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_temperature(0.7)
        .with_max_tokens(768);

        let response = self.backend.chat(request).await?;

        if let Some(usage) = &response.tokens_used {
            debug!(
                backend = self.backend.name(),
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "advice generated"
            );
        }

        let advice = response.content.trim().to_string();
        if advice.is_empty() {
            return Err(AdviceError::EmptyResponse);
        }
        Ok(advice)
    }
}

fn build_prompt(
    recent: &[DailyStat],
    weekday: &[WeekdayAverage],
) -> Result<String, AdviceError> {
    Ok(format!(
        "[Recent daily sleep log]\n{}\n\n[Average sleep by weekday (0=Sunday..6=Saturday)]\n{}\n\n\
         Analyze this sleep data and reply with observations and advice.",
        serde_json::to_string_pretty(recent)?,
        serde_json::to_string_pretty(weekday)?,
    ))
}

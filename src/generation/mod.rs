// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Grounded generation providers
//!
//! Generation is best-effort: callers treat every `GenerationError` as an
//! empty generation and keep the retrieval result.

pub mod anthropic;
pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

pub use anthropic::AnthropicGenerator;
pub use ollama::OllamaGenerator;

/// Errors from a generation provider
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Generation timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("No API key configured for {provider}")]
    NoApiKey { provider: String },

    #[error("Provider returned no text")]
    EmptyResponse,
}

/// Produces free text for a prompt
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Prompt asking the model to answer `instruction` over retrieved conversations
pub fn rag_prompt(instruction: &str, context: &str) -> String {
    format!(
        "Answer this query <query>{}</query>\n\
         about these conversations between\n\
         customer support people and customers: {}",
        instruction, context
    )
}

/// Concatenate retrieved texts into one context block
pub fn join_context<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| format!("[{}] {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n")
}

//! External content collaborators
//!
//! The pipeline talks to two black-box services: a generative text service
//! and an image search service. Both sit behind traits so the stages can be
//! driven by deterministic stubs in tests. The real adapters live in
//! [`gemini`] and [`tavily`].

pub mod gemini;
pub mod tavily;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use gemini::GeminiClient;
pub use tavily::TavilyClient;

/// Shared generation parameters passed into every content call.
///
/// Modeled as an explicit value rather than process-wide state so tests can
/// substitute deterministic configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,

    /// Maximum output tokens
    pub max_output_tokens: u32,

    /// Nucleus sampling parameter
    pub top_p: f32,

    /// Top-k sampling parameter
    pub top_k: u32,

    /// System instruction prepended to every prompt
    pub system_instruction: String,

    /// Enable the service's web search tool for grounded research
    pub search_grounding: bool,
}

impl GenerationConfig {
    /// Low-temperature profile for factual research reports.
    pub fn research() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: 8000,
            top_p: 0.9,
            top_k: 5,
            system_instruction: String::new(),
            search_grounding: true,
        }
    }

    /// Higher-temperature profile for message drafting.
    pub fn creative() -> Self {
        Self {
            temperature: 1.0,
            max_output_tokens: 8000,
            top_p: 0.9,
            top_k: 40,
            system_instruction: String::new(),
            search_grounding: false,
        }
    }

    /// Replace the system instruction, builder style.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::research()
    }
}

/// A candidate image returned by the search collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHit {
    /// Image URL
    pub url: String,

    /// Free-text description, when the service provides one
    #[serde(default)]
    pub description: Option<String>,
}

/// Generative content service.
///
/// The returned text is advisory free form; callers must salvage-parse it and
/// treat unparseable output as a degraded step, not a failure.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Generate free-form text for a prompt under the given configuration.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Image lookup service.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Return the conventional (first) image candidate for a name query,
    /// or `None` when the service has no results.
    async fn lookup_image(&self, query: &str) -> Result<Option<ImageHit>>;
}

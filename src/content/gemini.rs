//! Gemini generative-language adapter
//!
//! Thin reqwest client for the Google generative-language REST API. The only
//! hard failure is a missing API key at construction time; request errors are
//! surfaced as [`Error::Content`] and handled per call site.

use super::{ContentService, GenerationConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Safety categories relaxed for research output. The service otherwise
/// refuses to discuss some companies at all.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client, resolving the API key from the `GEMINI_API_KEY`
    /// environment variable. A missing key is a configuration error and the
    /// only fatal failure in the content path.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            Error::Config("GEMINI_API_KEY not set in the environment".to_string())
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
        })
    }

    fn request_body(prompt: &str, config: &GenerationConfig) -> serde_json::Value {
        let mut body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": config.temperature,
                "maxOutputTokens": config.max_output_tokens,
                "topP": config.top_p,
                "topK": config.top_k,
            },
            "safetySettings": SAFETY_CATEGORIES
                .iter()
                .map(|category| json!({"category": category, "threshold": "BLOCK_NONE"}))
                .collect::<Vec<_>>(),
        });

        if !config.system_instruction.is_empty() {
            body["systemInstruction"] =
                json!({"parts": [{"text": config.system_instruction}]});
        }
        if config.search_grounding {
            body["tools"] = json!([{"google_search": {}}]);
        }

        body
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ContentService for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(prompt, config))
            .send()
            .await
            .map_err(|e| Error::Content(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Content(format!(
                "Service returned HTTP {}",
                status
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Content(format!("Failed to parse response: {}", e)))?;

        let text = result
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Content("Service returned no text".to_string()));
        }

        Ok(text)
    }
}

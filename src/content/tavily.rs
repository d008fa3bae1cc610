//! Tavily image search adapter

use super::{ImageHit, ImageSearch};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const API_URL: &str = "https://api.tavily.com/search";

/// Client for the Tavily search API, used only for image lookup.
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyClient {
    /// Create a client, resolving the API key from the `TAVILY_API_KEY`
    /// environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY").map_err(|_| {
            Error::Config("TAVILY_API_KEY not set in the environment".to_string())
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    images: Vec<SearchImage>,
}

#[derive(Deserialize)]
struct SearchImage {
    url: String,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl ImageSearch for TavilyClient {
    async fn lookup_image(&self, query: &str) -> Result<Option<ImageHit>> {
        let payload = json!({
            "api_key": self.api_key,
            "query": query,
            "include_images": true,
            "include_image_descriptions": true,
        });

        let response = self
            .client
            .post(API_URL)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Search(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Search(format!("Service returned HTTP {}", status)));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Search(format!("Failed to parse response: {}", e)))?;

        Ok(result.images.into_iter().next().map(|img| ImageHit {
            url: img.url,
            description: img.description,
        }))
    }
}

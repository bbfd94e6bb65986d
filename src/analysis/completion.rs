use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TextGenerator;
use crate::config::OpenAi;

/// OpenAI legacy completions endpoint (`v1/completions`).
#[derive(Clone)]
pub struct CompletionClient {
    http: Client,
    base_url: Url,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    n: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

impl CompletionClient {
    pub fn from_config(cfg: &OpenAi) -> Result<Self> {
        let base_url = Url::parse(&cfg.base_url).context("invalid openai.base_url")?;
        let http = Client::builder()
            .user_agent("yt-outliers/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let endpoint = self
            .base_url
            .join("v1/completions")
            .context("invalid OpenAI base URL")?;
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            n: 1,
            temperature: self.temperature,
        };
        let res = self
            .http
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach OpenAI")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("openai error {}: {}", status, body));
        }
        let payload: CompletionResponse =
            res.json().await.context("invalid OpenAI response JSON")?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or_else(|| anyhow!("OpenAI returned no choices"))
    }
}

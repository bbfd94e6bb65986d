use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use std::fmt;

use super::VisionService;
use crate::config::Vision;

/// HTTP client for the thumbnail description service.
#[derive(Clone)]
pub struct VisionClient {
    http: Client,
    endpoint: Url,
    client_id: String,
}

impl fmt::Debug for VisionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    description: Option<String>,
}

impl VisionClient {
    pub fn new(endpoint: Url, client_id: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent("yt-outliers/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            client_id,
        })
    }

    pub fn from_config(cfg: &Vision) -> Result<Self> {
        let endpoint = Url::parse(&cfg.endpoint).context("invalid vision.endpoint")?;
        Self::new(endpoint, cfg.client_id.clone())
    }
}

#[async_trait]
impl VisionService for VisionClient {
    async fn analyze(&self, image_url: &str) -> Result<Option<String>> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.client_id)
            .json(&json!({ "image_url": image_url }))
            .send()
            .await
            .context("failed to reach vision service")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("vision error {}: {}", status, body));
        }
        let payload: AnalyzeResponse = res
            .json()
            .await
            .context("invalid vision response JSON")?;
        Ok(payload.description.filter(|d| !d.trim().is_empty()))
    }
}

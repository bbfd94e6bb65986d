use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, warn};

use crate::config::{Config, MAX_BATCH_SIZE};
use crate::youtube::model::{ApiErrorResponse, ChannelItem, ListResponse, SearchItem, VideoItem};

pub mod model;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3/";

/// Parameters of one `search.list` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub channel_id: Option<String>,
    pub published_after: Option<DateTime<Utc>>,
    pub max_results: u32,
}

/// Search and detail lookups against the video platform.
///
/// Detail lookups accept at most [`MAX_BATCH_SIZE`] ids per call; chunking is
/// the caller's job.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchItem>>;

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoItem>>;

    async fn channel_details(&self, ids: &[String]) -> Result<Vec<ChannelItem>>;
}

#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self> {
        let base_url = Url::parse(YOUTUBE_API_BASE).context("invalid default YouTube URL")?;
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, mut base_url: Url) -> Result<Self> {
        // `Url::join` drops the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent("yt-outliers/0.1")
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.youtube.base_url).context("invalid youtube.base_url")?;
        Self::with_base_url(cfg.youtube.api_key.clone(), base_url)
    }

    pub fn build_search_request(&self, request: &SearchRequest) -> Result<reqwest::Request> {
        let endpoint = self.base_url.join("search").context("invalid YouTube base URL")?;
        let mut query: Vec<(&str, String)> = vec![
            ("part", "id,snippet".into()),
            ("type", "video".into()),
            ("q", request.query.clone()),
            ("maxResults", request.max_results.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(channel_id) = &request.channel_id {
            query.push(("channelId", channel_id.clone()));
        }
        if let Some(after) = request.published_after {
            query.push((
                "publishedAfter",
                after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }
        self.http
            .get(endpoint)
            .query(&query)
            .build()
            .context("failed to build search request")
    }

    pub fn build_list_request(
        &self,
        resource: &str,
        part: &str,
        ids: &[String],
    ) -> Result<reqwest::Request> {
        if ids.len() > MAX_BATCH_SIZE {
            bail!(
                "{} ids requested from {}; the limit is {}",
                ids.len(),
                resource,
                MAX_BATCH_SIZE
            );
        }
        let endpoint = self
            .base_url
            .join(resource)
            .context("invalid YouTube base URL")?;
        self.http
            .get(endpoint)
            .query(&[
                ("part", part),
                ("id", ids.join(",").as_str()),
                ("maxResults", MAX_BATCH_SIZE.to_string().as_str()),
                ("key", self.api_key.as_str()),
            ])
            .build()
            .with_context(|| format!("failed to build {resource} request"))
    }

    async fn execute_list<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<Vec<T>> {
        // The query string carries the API key; log the path only.
        let path = request.url().path().to_string();
        debug!(%path, "youtube request");

        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("failed to reach YouTube ({path})"))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                warn!(%status, %path, "YouTube refused request: {}", message);
            }
            return Err(anyhow!("youtube error {} on {}: {}", status, path, message));
        }

        let payload: ListResponse<T> = res
            .json()
            .await
            .with_context(|| format!("invalid YouTube response JSON ({path})"))?;
        debug!(%path, items = payload.items.len(), "youtube response");
        Ok(payload.items)
    }
}

#[async_trait]
impl VideoProvider for YouTubeClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchItem>> {
        let req = self.build_search_request(request)?;
        self.execute_list(req).await
    }

    async fn video_details(&self, ids: &[String]) -> Result<Vec<VideoItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let req = self.build_list_request("videos", "snippet,statistics,contentDetails", ids)?;
        self.execute_list(req).await
    }

    async fn channel_details(&self, ids: &[String]) -> Result<Vec<ChannelItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let req = self.build_list_request("channels", "statistics", ids)?;
        self.execute_list(req).await
    }
}

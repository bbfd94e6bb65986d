//! Subset of the YouTube Data API v3 payloads the pipeline reads.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One `search.list` hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchItemId,
    #[serde(default)]
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnails: HashMap<String, Thumbnail>,
}

impl Snippet {
    /// Medium thumbnail, falling back to the default size.
    pub fn thumbnail_url(&self) -> Option<&str> {
        ["medium", "default"]
            .iter()
            .find_map(|size| self.thumbnails.get(*size))
            .map(|t| t.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

/// One `videos.list` record (`snippet,statistics,contentDetails`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Snippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default)]
    pub content_details: ContentDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

/// One `channels.list` record (`statistics`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelItem {
    pub id: String,
    #[serde(default)]
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub video_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

//! Discovery pipeline: search, batched detail lookups, scoring, classification
//! and sorting.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::classify::classify;
use crate::config::MAX_BATCH_SIZE;
use crate::duration;
use crate::model::{ChannelStats, ResultBundle, SortOrder, VideoRecord};
use crate::score::outlier_score;
use crate::youtube::model::{ChannelItem, SearchItem, VideoItem};
use crate::youtube::{SearchRequest, VideoProvider};

/// Result caps and batching used by [`discover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverOptions {
    pub per_channel_max_results: u32,
    pub max_results: u32,
    pub batch_size: usize,
    /// Channel searches in flight at once; 1 searches strictly in sequence.
    pub channel_concurrency: usize,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            per_channel_max_results: 10,
            max_results: 20,
            batch_size: MAX_BATCH_SIZE,
            channel_concurrency: 4,
        }
    }
}

/// Inputs of one discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoverRequest<'a> {
    pub query: &'a str,
    pub published_after: Option<DateTime<Utc>>,
    pub channels: Option<&'a [String]>,
    pub sort: SortOrder,
}

/// Run the full pipeline against `provider` and return both sorted buckets.
///
/// A failed channel search is logged and skipped; when every channel fails the
/// result is simply empty. A failed broad search or detail lookup is returned
/// as an error.
#[instrument(skip_all, fields(query = %request.query))]
pub async fn discover(
    provider: &dyn VideoProvider,
    request: &DiscoverRequest<'_>,
    options: &DiscoverOptions,
) -> Result<ResultBundle> {
    let hits = match request.channels.filter(|c| !c.is_empty()) {
        Some(channels) => search_channels(provider, request, channels, options).await,
        None => provider
            .search(&SearchRequest {
                query: request.query.to_string(),
                channel_id: None,
                published_after: request.published_after,
                max_results: options.max_results,
            })
            .await
            .context("search failed")?,
    };

    let (video_ids, channel_ids) = collect_ids(&hits);
    info!(
        hits = hits.len(),
        videos = video_ids.len(),
        channels = channel_ids.len(),
        "search complete"
    );
    if video_ids.is_empty() {
        return Ok(ResultBundle::default());
    }

    let batch_size = options.batch_size.clamp(1, MAX_BATCH_SIZE);
    let videos = fetch_batched(&video_ids, batch_size, |ids| provider.video_details(ids))
        .await
        .context("video detail lookup failed")?;
    let channels = fetch_batched(&channel_ids, batch_size, |ids| provider.channel_details(ids))
        .await
        .context("channel detail lookup failed")?;

    let stats = channel_stats(channels);
    let records: Vec<VideoRecord> = videos.iter().map(|v| enrich(v, &stats)).collect();
    let (mut regular, mut shorts) = classify(records);
    sort_videos(&mut regular, request.sort);
    sort_videos(&mut shorts, request.sort);

    Ok(ResultBundle { regular, shorts })
}

async fn search_channels(
    provider: &dyn VideoProvider,
    request: &DiscoverRequest<'_>,
    channels: &[String],
    options: &DiscoverOptions,
) -> Vec<SearchItem> {
    // `buffered` yields in input order, so results concatenate exactly as a
    // sequential run would.
    let outcomes: Vec<(&String, Result<Vec<SearchItem>>)> = stream::iter(channels)
        .map(|channel_id| async move {
            let outcome = provider
                .search(&SearchRequest {
                    query: request.query.to_string(),
                    channel_id: Some(channel_id.clone()),
                    published_after: request.published_after,
                    max_results: options.per_channel_max_results,
                })
                .await;
            (channel_id, outcome)
        })
        .buffered(options.channel_concurrency.max(1))
        .collect()
        .await;

    let mut hits = Vec::new();
    let mut failures = 0usize;
    for (channel_id, outcome) in outcomes {
        match outcome {
            Ok(items) => {
                debug!(%channel_id, items = items.len(), "channel search done");
                hits.extend(items);
            }
            Err(err) => {
                failures += 1;
                warn!(?err, %channel_id, "channel search failed; skipping");
            }
        }
    }

    if failures > 0 {
        info!(failures, channels = channels.len(), "channel searches skipped");
    }
    hits
}

/// Distinct video and channel ids in first-seen order. Hits without a video
/// id are dropped entirely.
pub fn collect_ids(hits: &[SearchItem]) -> (Vec<String>, Vec<String>) {
    let mut seen_videos = HashSet::new();
    let mut seen_channels = HashSet::new();
    let mut video_ids = Vec::new();
    let mut channel_ids = Vec::new();
    for hit in hits {
        let Some(video_id) = hit.id.video_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        if seen_videos.insert(video_id) {
            video_ids.push(video_id.to_string());
        }
        if let Some(channel_id) = hit.snippet.channel_id.as_deref() {
            if seen_channels.insert(channel_id) {
                channel_ids.push(channel_id.to_string());
            }
        }
    }
    (video_ids, channel_ids)
}

/// Split `ids` into consecutive batches of at most `batch_size`.
pub fn chunk_ids(ids: &[String], batch_size: usize) -> Vec<&[String]> {
    ids.chunks(batch_size.max(1)).collect()
}

/// Fetch one batch at a time and flatten the responses.
pub async fn fetch_batched<'a, T, F, Fut>(
    ids: &'a [String],
    batch_size: usize,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(&'a [String]) -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>>>,
{
    let mut out = Vec::with_capacity(ids.len());
    for batch in chunk_ids(ids, batch_size) {
        out.extend(fetch(batch).await?);
    }
    Ok(out)
}

fn channel_stats(channels: Vec<ChannelItem>) -> HashMap<String, ChannelStats> {
    channels
        .into_iter()
        .map(|c| {
            let stats = ChannelStats::new(
                c.statistics.view_count.as_deref(),
                c.statistics.video_count.as_deref(),
            );
            (c.id, stats)
        })
        .collect()
}

fn enrich(video: &VideoItem, stats: &HashMap<String, ChannelStats>) -> VideoRecord {
    let channel_id = video.snippet.channel_id.clone().unwrap_or_default();
    let view_count = video
        .statistics
        .view_count
        .as_deref()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let duration_seconds = video
        .content_details
        .duration
        .as_deref()
        .map(duration::parse)
        .unwrap_or(0);

    let fallback = ChannelStats::default();
    let channel = stats.get(&channel_id).unwrap_or(&fallback);
    let outlier_score = outlier_score(view_count, &channel.total_views, &channel.video_count);

    VideoRecord {
        id: video.id.clone(),
        channel_id,
        title: video.snippet.title.clone().unwrap_or_default(),
        thumbnail_url: video.snippet.thumbnail_url().map(str::to_string),
        view_count,
        duration_seconds,
        outlier_score,
    }
}

/// Descending stable sort; ties keep provider order.
pub fn sort_videos(videos: &mut [VideoRecord], order: SortOrder) {
    match order {
        SortOrder::Views => videos.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        SortOrder::OutlierScore => {
            videos.sort_by(|a, b| b.outlier_score.total_cmp(&a.outlier_score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::model::{SearchItemId, Snippet};

    fn record(id: &str, view_count: u64, outlier_score: f64) -> VideoRecord {
        VideoRecord {
            id: id.into(),
            channel_id: "UC".into(),
            title: id.into(),
            thumbnail_url: None,
            view_count,
            duration_seconds: 120,
            outlier_score,
        }
    }

    fn hit(video_id: Option<&str>, channel_id: &str) -> SearchItem {
        SearchItem {
            id: SearchItemId {
                video_id: video_id.map(str::to_string),
            },
            snippet: Snippet {
                channel_id: Some(channel_id.into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn sorts_by_views_descending() {
        let mut videos = vec![record("a", 5, 0.0), record("b", 50, 0.0), record("c", 20, 0.0)];
        sort_videos(&mut videos, SortOrder::Views);
        let views: Vec<u64> = videos.iter().map(|v| v.view_count).collect();
        assert_eq!(views, [50, 20, 5]);
    }

    #[test]
    fn sorts_by_score_and_keeps_ties_stable() {
        let mut videos = vec![
            record("a", 1, 1.5),
            record("b", 2, 3.0),
            record("c", 3, 1.5),
            record("d", 4, 0.0),
        ];
        sort_videos(&mut videos, SortOrder::OutlierScore);
        let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c", "d"]);
    }

    #[test]
    fn chunks_into_provider_batches() {
        let ids: Vec<String> = (0..120).map(|i| format!("v{i}")).collect();
        let batches = chunk_ids(&ids, 50);
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, [50, 50, 20]);
        assert!(chunk_ids(&[], 50).is_empty());
    }

    #[test]
    fn collects_distinct_ids_and_drops_non_videos() {
        let hits = vec![
            hit(Some("v1"), "UC1"),
            hit(None, "UC9"),
            hit(Some("v2"), "UC2"),
            hit(Some("v1"), "UC1"),
            hit(Some("v3"), "UC1"),
        ];
        let (videos, channels) = collect_ids(&hits);
        assert_eq!(videos, ["v1", "v2", "v3"]);
        assert_eq!(channels, ["UC1", "UC2"]);
    }

    #[test]
    fn enrich_defaults_missing_channel_and_fields() {
        let video = VideoItem {
            id: "v1".into(),
            snippet: Snippet {
                channel_id: Some("UCmissing".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let record = enrich(&video, &HashMap::new());
        assert_eq!(record.view_count, 0);
        assert_eq!(record.duration_seconds, 0);
        assert_eq!(record.outlier_score, 0.0);
        assert!(record.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn fetch_batched_merges_every_batch() {
        let ids: Vec<String> = (0..120).map(|i| format!("v{i}")).collect();
        let mut calls = Vec::new();
        let merged = fetch_batched(&ids, 50, |batch| {
            calls.push(batch.len());
            let echoed = batch.to_vec();
            async move { Ok::<_, anyhow::Error>(echoed) }
        })
        .await
        .unwrap();
        assert_eq!(calls, [50, 50, 20]);
        assert_eq!(merged, ids);
    }
}

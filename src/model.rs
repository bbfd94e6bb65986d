use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One discovered video, enriched and scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
    pub duration_seconds: u64,
    pub outlier_score: f64,
}

/// Channel statistics as reported by the provider.
///
/// Values stay in their string form so a malformed statistic still scores 0
/// instead of being silently replaced by a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStats {
    pub total_views: String,
    pub video_count: String,
}

impl ChannelStats {
    /// Missing totals count as "0"; a missing or zero video count as "1".
    pub fn new(total_views: Option<&str>, video_count: Option<&str>) -> Self {
        let video_count = match video_count.map(str::trim) {
            None | Some("") | Some("0") => "1",
            Some(other) => other,
        };
        Self {
            total_views: total_views.unwrap_or("0").to_string(),
            video_count: video_count.to_string(),
        }
    }
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// The cached and returned unit: both buckets in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultBundle {
    pub regular: Vec<VideoRecord>,
    pub shorts: Vec<VideoRecord>,
}

impl ResultBundle {
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.shorts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regular.len() + self.shorts.len()
    }

    pub fn find(&self, video_id: &str) -> Option<&VideoRecord> {
        self.regular
            .iter()
            .chain(self.shorts.iter())
            .find(|v| v.id == video_id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} {value:?}; expected one of: {expected}")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Whether a search is open or restricted to a channel allow-list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Generic,
    Niche,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Generic => "generic",
            SearchMode::Niche => "niche",
        }
    }
}

impl FromStr for SearchMode {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(SearchMode::Generic),
            "niche" => Ok(SearchMode::Niche),
            other => Err(ParseChoiceError {
                kind: "search mode",
                value: other.to_string(),
                expected: "generic, niche",
            }),
        }
    }
}

/// Upload-date window applied to the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeframe {
    #[default]
    Any,
    Hours24,
    Hours48,
    Days7,
    Days15,
    Month,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Any => "any",
            Timeframe::Hours24 => "24h",
            Timeframe::Hours48 => "48h",
            Timeframe::Days7 => "7d",
            Timeframe::Days15 => "15d",
            Timeframe::Month => "1m",
        }
    }

    pub fn window(&self) -> Option<Duration> {
        match self {
            Timeframe::Any => None,
            Timeframe::Hours24 => Some(Duration::hours(24)),
            Timeframe::Hours48 => Some(Duration::hours(48)),
            Timeframe::Days7 => Some(Duration::days(7)),
            Timeframe::Days15 => Some(Duration::days(15)),
            // A month is a flat 30 days.
            Timeframe::Month => Some(Duration::days(30)),
        }
    }

    /// Lower bound for the video's publish time, relative to `now`.
    pub fn published_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|w| now - w)
    }
}

impl FromStr for Timeframe {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Timeframe::Any),
            "24h" => Ok(Timeframe::Hours24),
            "48h" => Ok(Timeframe::Hours48),
            "7d" => Ok(Timeframe::Days7),
            "15d" => Ok(Timeframe::Days15),
            "1m" => Ok(Timeframe::Month),
            other => Err(ParseChoiceError {
                kind: "timeframe",
                value: other.to_string(),
                expected: "any, 24h, 48h, 7d, 15d, 1m",
            }),
        }
    }
}

/// Descending sort key applied to each bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Views,
    OutlierScore,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Views => "views",
            SortOrder::OutlierScore => "outlier",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" => Ok(SortOrder::Views),
            "outlier" | "outlier-score" => Ok(SortOrder::OutlierScore),
            other => Err(ParseChoiceError {
                kind: "sort order",
                value: other.to_string(),
                expected: "views, outlier",
            }),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(SearchMode, Timeframe, SortOrder);

/// Every user-selected parameter of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub mode: SearchMode,
    pub channels: Vec<String>,
    pub query: String,
    pub timeframe: Timeframe,
    pub sort: SortOrder,
}

const KEY_DELIMITER: &str = "|";
const LIST_DELIMITER: &str = ",";

impl SearchParams {
    /// Channel allow-list in effect; generic searches never restrict channels.
    pub fn allow_list(&self) -> Option<&[String]> {
        match self.mode {
            SearchMode::Niche if !self.channels.is_empty() => Some(&self.channels),
            _ => None,
        }
    }

    /// Deterministic cache key: mode, channels, query, timeframe and sort
    /// joined by `|`. Delimiters inside fields are percent-escaped, so
    /// distinct parameter tuples never collide.
    pub fn cache_key(&self) -> String {
        let channels = self
            .channels
            .iter()
            .map(|c| escape_key_field(c))
            .collect::<Vec<_>>()
            .join(LIST_DELIMITER);
        [
            self.mode.as_str().to_string(),
            channels,
            escape_key_field(&self.query),
            self.timeframe.as_str().to_string(),
            self.sort.as_str().to_string(),
        ]
        .join(KEY_DELIMITER)
    }
}

fn escape_key_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '|' => out.push_str("%7C"),
            ',' => out.push_str("%2C"),
            other => out.push(other),
        }
    }
    out
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::db::{self, Pool};
use crate::model::{ResultBundle, SearchParams};
use crate::search::{discover, DiscoverOptions, DiscoverRequest};
use crate::youtube::VideoProvider;

/// How a search request was answered.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Cached(ResultBundle),
    Fresh(ResultBundle),
    /// The provider answered but nothing matched; nothing was cached.
    NoResults,
}

impl SearchOutcome {
    pub fn bundle(&self) -> Option<&ResultBundle> {
        match self {
            SearchOutcome::Cached(b) | SearchOutcome::Fresh(b) => Some(b),
            SearchOutcome::NoResults => None,
        }
    }

    pub fn into_bundle(self) -> Option<ResultBundle> {
        match self {
            SearchOutcome::Cached(b) | SearchOutcome::Fresh(b) => Some(b),
            SearchOutcome::NoResults => None,
        }
    }
}

/// Answer a search from the cache or, on a miss (or with `refresh`), by
/// running discovery and storing the result.
///
/// The session log append never fails the search; a failed cache write does.
#[instrument(skip_all, fields(query = %params.query, mode = %params.mode))]
pub async fn run_search(
    pool: &Pool,
    provider: &dyn VideoProvider,
    params: &SearchParams,
    options: &DiscoverOptions,
    now: DateTime<Utc>,
    refresh: bool,
) -> Result<SearchOutcome> {
    let key = params.cache_key();

    if !refresh {
        if let Some(bundle) = db::get_cache(pool, &key).await? {
            info!(%key, videos = bundle.len(), "cache hit");
            return Ok(SearchOutcome::Cached(bundle));
        }
    }

    let request = DiscoverRequest {
        query: &params.query,
        published_after: params.timeframe.published_after(now),
        channels: params.allow_list(),
        sort: params.sort,
    };
    let bundle = discover(provider, &request, options).await?;
    if bundle.is_empty() {
        info!(%key, "no results");
        return Ok(SearchOutcome::NoResults);
    }

    db::put_cache(pool, &key, &bundle).await?;
    if let Err(err) = db::append_session_log(pool, &key, &bundle).await {
        warn!(?err, %key, "failed to append session log");
    }
    info!(
        %key,
        regular = bundle.regular.len(),
        shorts = bundle.shorts.len(),
        "search cached"
    );
    Ok(SearchOutcome::Fresh(bundle))
}

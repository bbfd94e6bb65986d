use super::model::{CacheEntry, SessionLogEntry};
use crate::model::ResultBundle;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{instrument, warn};

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let in_memory = normalized.starts_with("sqlite::memory");
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {normalized}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    // Every in-memory connection is its own database.
    let max_connections = if in_memory { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("failed to open cache database")?;
    Ok(pool)
}

/// Expand a leading `~/` in file-backed SQLite URLs and make sure the parent
/// directory exists. In-memory and non-sqlite URLs pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let path = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{path}?{q}"),
        None => format!("sqlite://{path}"),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Cached bundle for `key`. A stored document that no longer decodes is
/// reported and treated as a miss.
#[instrument(skip_all, fields(key = %key))]
pub async fn get_cache(pool: &Pool, key: &str) -> Result<Option<ResultBundle>> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM cache WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("failed to read cache")?;
    let Some(data) = data else {
        return Ok(None);
    };
    match serde_json::from_str(&data) {
        Ok(bundle) => Ok(Some(bundle)),
        Err(err) => {
            warn!(?err, key, "discarding undecodable cache entry");
            Ok(None)
        }
    }
}

/// Insert or replace the cached bundle for `key` in a single statement.
#[instrument(skip_all, fields(key = %key))]
pub async fn put_cache(pool: &Pool, key: &str, value: &ResultBundle) -> Result<()> {
    let data = serde_json::to_string(value).context("failed to encode result bundle")?;
    sqlx::query(
        "INSERT INTO cache (key, data, timestamp) VALUES (?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET data = excluded.data, timestamp = excluded.timestamp",
    )
    .bind(key)
    .bind(data)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("failed to write cache")?;
    Ok(())
}

#[instrument(skip_all, fields(key = %key))]
pub async fn append_session_log(pool: &Pool, key: &str, value: &ResultBundle) -> Result<i64> {
    let data = serde_json::to_string(value).context("failed to encode result bundle")?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO sessions (key, data, timestamp) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(key)
    .bind(data)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("failed to append session log")?;
    Ok(id)
}

pub async fn list_cache_entries(pool: &Pool) -> Result<Vec<CacheEntry>> {
    let rows = sqlx::query("SELECT key, data, timestamp FROM cache ORDER BY key ASC")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| {
            let (value, created_at) = decode_row(row)?;
            Ok(CacheEntry {
                key: row.get("key"),
                value,
                created_at,
            })
        })
        .collect()
}

pub async fn list_session_entries(pool: &Pool) -> Result<Vec<SessionLogEntry>> {
    let rows = sqlx::query("SELECT id, key, data, timestamp FROM sessions ORDER BY id ASC")
        .fetch_all(pool)
        .await?;
    rows.iter()
        .map(|row| {
            let (value, logged_at) = decode_row(row)?;
            Ok(SessionLogEntry {
                id: row.get("id"),
                key: row.get("key"),
                value,
                logged_at,
            })
        })
        .collect()
}

/// Every cache and session row, for diagnostics.
#[instrument(skip_all)]
pub async fn list_all(pool: &Pool) -> Result<(Vec<CacheEntry>, Vec<SessionLogEntry>)> {
    let cache = list_cache_entries(pool).await?;
    let sessions = list_session_entries(pool).await?;
    Ok((cache, sessions))
}

fn decode_row(row: &SqliteRow) -> Result<(ResultBundle, DateTime<Utc>)> {
    let key: String = row.get("key");
    let data: String = row.get("data");
    let value = serde_json::from_str(&data)
        .with_context(|| format!("stored bundle for {key} is not valid JSON"))?;
    let at: DateTime<Utc> = row
        .try_get("timestamp")
        .with_context(|| format!("stored timestamp for {key} is invalid"))?;
    Ok((value, at))
}

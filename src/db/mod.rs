//! Database module: cache entities and SQL repositories.
//!
//! This module is split into two submodules:
//! - `model`: rows of the `cache` and `sessions` tables.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `yt_outliers::db`; the repository API
//! is re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{CacheEntry, SessionLogEntry};

//! Named channel allow-lists, loaded from a JSON document such as
//! `{"India": ["UC..."], "USA": ["UC..."]}`.
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelGroupsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid channel groups JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChannelGroups {
    groups: HashMap<String, Vec<String>>,
}

impl ChannelGroups {
    pub fn from_json(text: &str) -> Result<Self, ChannelGroupsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ChannelGroupsError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Concatenate the named groups in the order given. Unknown names and
    /// blank ids contribute nothing; an id shared by two groups is kept once.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let Some(ids) = self.groups.get(name.as_ref()) else {
                continue;
            };
            for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
                if !out.iter().any(|existing| existing == id) {
                    out.push(id.to_string());
                }
            }
        }
        out
    }
}

//! Page flow of one interactive session: search, browse the results, analyze
//! a selected thumbnail, and go back.
use thiserror::Error;

use crate::model::{ResultBundle, VideoRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no results are being displayed")]
    NothingDisplayed,
    #[error("video {0} is not among the displayed results")]
    UnknownVideo(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Page {
    #[default]
    Searching,
    Displaying {
        results: ResultBundle,
    },
    Analyzing {
        results: ResultBundle,
        video: VideoRecord,
    },
}

impl Page {
    /// A finished search always lands on the results page.
    pub fn show_results(self, results: ResultBundle) -> Page {
        Page::Displaying { results }
    }

    pub fn select_video(self, video_id: &str) -> Result<Page, TransitionError> {
        let Page::Displaying { results } = self else {
            return Err(TransitionError::NothingDisplayed);
        };
        let video = results
            .find(video_id)
            .cloned()
            .ok_or_else(|| TransitionError::UnknownVideo(video_id.to_string()))?;
        Ok(Page::Analyzing { results, video })
    }

    /// Analysis returns to its results; results return to a fresh search.
    pub fn back(self) -> Page {
        match self {
            Page::Analyzing { results, .. } => Page::Displaying { results },
            Page::Displaying { .. } | Page::Searching => Page::Searching,
        }
    }

    pub fn selected_video(&self) -> Option<&VideoRecord> {
        match self {
            Page::Analyzing { video, .. } => Some(video),
            _ => None,
        }
    }
}

//! Thumbnail analysis: a vision service describes the image, a text model
//! narrates the description. Neither failure reaches the caller.
use anyhow::Result;
use async_trait::async_trait;
use tracing::{instrument, warn};

pub mod completion;
pub mod vision;

pub use completion::CompletionClient;
pub use vision::VisionClient;

pub const NO_DESCRIPTION: &str = "No description available.";
pub const VISION_FAILED: &str = "Error analyzing thumbnail.";
pub const COMPLETION_FAILED: &str = "Error generating description.";

#[async_trait]
pub trait VisionService: Send + Sync {
    /// Describe the image at `image_url`; `Ok(None)` when the service has no
    /// description for it.
    async fn analyze(&self, image_url: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailAnalysis {
    pub description: String,
    pub narration: String,
}

pub fn narration_prompt(description: &str) -> String {
    format!("Describe what is happening in the thumbnail: {description}")
}

#[instrument(skip_all, fields(image_url = %image_url))]
pub async fn analyze_thumbnail(
    vision: &dyn VisionService,
    text: &dyn TextGenerator,
    image_url: &str,
) -> ThumbnailAnalysis {
    let description = match vision.analyze(image_url).await {
        Ok(Some(d)) => d,
        Ok(None) => NO_DESCRIPTION.to_string(),
        Err(err) => {
            warn!(?err, "thumbnail analysis failed");
            VISION_FAILED.to_string()
        }
    };

    let narration = match text.complete(&narration_prompt(&description)).await {
        Ok(t) => t.trim().to_string(),
        Err(err) => {
            warn!(?err, "description generation failed");
            COMPLETION_FAILED.to_string()
        }
    };

    ThumbnailAnalysis {
        description,
        narration,
    }
}

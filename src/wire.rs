//! Request and response bodies of the labs task API

use crate::types::{Asset, GenerationResult, JobStatus};
use serde::{Deserialize, Serialize};

/// Task type for text-to-image jobs
pub const TEXT_TO_IMAGE: &str = "text2im";

/// Body of a task submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Task type, always [`TEXT_TO_IMAGE`]
    pub task_type: String,
    /// Caption and batch size
    pub prompt: TaskPrompt,
}

/// Prompt part of a task submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPrompt {
    /// Text the images are generated from
    pub caption: String,
    /// Number of images requested
    pub batch_size: u32,
}

impl TaskRequest {
    /// Build a text-to-image request
    pub fn text_to_image(caption: impl Into<String>, batch_size: u32) -> Self {
        Self {
            task_type: TEXT_TO_IMAGE.to_string(),
            prompt: TaskPrompt {
                caption: caption.into(),
                batch_size,
            },
        }
    }
}

/// Task object returned by submission and status requests
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResponse {
    /// Task id
    pub id: String,
    /// Raw status string
    #[serde(default)]
    pub status: String,
    /// Creation time as unix seconds
    #[serde(default)]
    pub created: Option<i64>,
    /// Generated images, present once the task succeeded
    #[serde(default)]
    pub generations: Option<GenerationList>,
}

impl TaskResponse {
    /// Status mapped onto the poller's state machine
    pub fn job_status(&self) -> JobStatus {
        JobStatus::from_remote(&self.status)
    }

    /// Assets of a succeeded task (empty if none were returned)
    pub fn into_result(self) -> GenerationResult {
        self.generations
            .map(GenerationList::into_result)
            .unwrap_or_default()
    }
}

/// List wrapper used for both task generations and collection pages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationList {
    /// Items in service order
    #[serde(default)]
    pub data: Vec<GenerationItem>,
}

impl GenerationList {
    /// Convert to assets, keeping order
    pub fn into_result(self) -> GenerationResult {
        GenerationResult::new(self.data.into_iter().map(Asset::from).collect())
    }
}

/// One generated image
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationItem {
    /// Generation id
    pub id: String,
    /// Image payload
    pub generation: GenerationImage,
}

/// Image reference inside a generation item
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationImage {
    /// Remote image URL
    pub image_path: String,
}

impl From<GenerationItem> for Asset {
    fn from(item: GenerationItem) -> Self {
        Asset {
            id: item.id,
            image_url: item.generation.image_path,
        }
    }
}

//! Image domain model: the product of a successful task, and everything it
//! owns (variants, tags, description, colors, embedding).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an image as it moves through the pipeline. Transitions are
/// monotonic in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Pending,
    Processing,
    Tagging,
    Ready,
    Approved,
    Rejected,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Tagging => "tagging",
            Self::Ready => "ready",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "tagging" => Some(Self::Tagging),
            "ready" => Some(Self::Ready),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Closed set of size presets. Additions require a schema change, per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePreset {
    Thumbnail,
    ProductCard,
    FullProduct,
    HeroImage,
    FullRes,
}

impl SizePreset {
    /// All presets a `ready` image must have exactly one variant for.
    pub const ALL: [Self; 5] = [
        Self::Thumbnail,
        Self::ProductCard,
        Self::FullProduct,
        Self::HeroImage,
        Self::FullRes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::ProductCard => "product_card",
            Self::FullProduct => "full_product",
            Self::HeroImage => "hero_image",
            Self::FullRes => "full_res",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "thumbnail" => Some(Self::Thumbnail),
            "product_card" => Some(Self::ProductCard),
            "full_product" => Some(Self::FullProduct),
            "hero_image" => Some(Self::HeroImage),
            "full_res" => Some(Self::FullRes),
            _ => None,
        }
    }

    /// Target `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Thumbnail => (150, 150),
            Self::ProductCard => (400, 300),
            Self::FullProduct => (800, 600),
            Self::HeroImage => (1920, 600),
            Self::FullRes => (2048, 2048),
        }
    }
}

/// Where a tag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    Auto,
    Manual,
    Template,
}

impl TagSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::Template => "template",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            "template" => Some(Self::Template),
            _ => None,
        }
    }
}

/// A resized encoding of an image at one size preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub image_id: Uuid,
    pub preset: SizePreset,
    pub path: String,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
}

/// A tag attached to an image, deduped per image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub image_id: Uuid,
    pub tag: String,
    pub confidence: f32,
    pub source: TagSource,
}

/// The (at most one) description of an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Description {
    pub image_id: Uuid,
    pub description: String,
    pub analysis: Option<String>,
    pub model: String,
}

/// A dominant or secondary color extracted from an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Color {
    pub image_id: Uuid,
    pub hex: String,
    pub percentage: f32,
    pub is_dominant: bool,
}

/// The (at most one) embedding vector of an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub image_id: Uuid,
    pub vector: Vec<f32>,
    pub model: String,
}

/// The product of a successfully completed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub task_id: Uuid,
    pub prompt: String,
    pub style: String,
    pub status: ImageStatus,
    pub tagging_confidence: Option<f32>,
    pub generation_cost: Option<f64>,
    pub tagging_cost: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn new(id: Uuid, task_id: Uuid, prompt: String, style: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            task_id,
            prompt,
            style,
            status: ImageStatus::Pending,
            tagging_confidence: None,
            generation_cost: None,
            tagging_cost: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The full set of material produced by a pipeline run, assembled before
/// the commit step persists it atomically.
#[derive(Debug, Clone)]
pub struct ImageAssets {
    pub variants: Vec<Variant>,
    pub tags: Vec<Tag>,
    pub description: Description,
    pub colors: Vec<Color>,
    pub embedding: Embedding,
}

//! Domain models: the entities described in spec §3.

pub mod config;
pub mod image;
pub mod job;
pub mod task;

pub use config::Config;
pub use image::{Color, Description, Embedding, Image, ImageAssets, ImageStatus, SizePreset, Tag, TagSource, Variant};
pub use job::{Job, JobStatus};
pub use task::{FailureKind, Style, Task, TaskOutcome, TaskStatus};

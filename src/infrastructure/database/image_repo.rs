//! SQLite implementation of [`ImageRepository`].

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Color, Description, Image, ImageAssets, ImageStatus, SizePreset, Tag, TagSource, Variant};
use crate::domain::ports::image_repository::ImageRepository;

use super::utils::parse_datetime;

pub struct ImageRepositoryImpl {
    pool: SqlitePool,
}

impl ImageRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_image(row: &sqlx::sqlite::SqliteRow) -> DomainResult<Image> {
        Ok(Image {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            task_id: Uuid::parse_str(row.get::<String, _>("task_id").as_str())
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            prompt: row.get::<String, _>("prompt"),
            style: row.get::<String, _>("style"),
            status: ImageStatus::from_str(row.get::<String, _>("status").as_str())
                .ok_or_else(|| DomainError::SerializationError("unknown image status".into()))?,
            tagging_confidence: row.get::<Option<f64>, _>("tagging_confidence").map(|v| v as f32),
            generation_cost: row.get::<Option<f64>, _>("generation_cost"),
            tagging_cost: row.get::<Option<f64>, _>("tagging_cost"),
            created_at: parse_datetime(row.get::<String, _>("created_at").as_str())?,
            updated_at: parse_datetime(row.get::<String, _>("updated_at").as_str())?,
        })
    }
}

#[async_trait]
impl ImageRepository for ImageRepositoryImpl {
    async fn create(&self, image: &Image) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO image (id, task_id, prompt, style, status, tagging_confidence, generation_cost, tagging_cost, pending_cleanup, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(image.id.to_string())
        .bind(image.task_id.to_string())
        .bind(&image.prompt)
        .bind(&image.style)
        .bind(image.status.as_str())
        .bind(image.tagging_confidence.map(f64::from))
        .bind(image.generation_cost)
        .bind(image.tagging_cost)
        .bind(image.created_at.to_rfc3339())
        .bind(image.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Image>> {
        let row = sqlx::query("SELECT * FROM image WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_image).transpose()
    }

    async fn get_by_task(&self, task_id: Uuid) -> DomainResult<Option<Image>> {
        let row = sqlx::query("SELECT * FROM image WHERE task_id = ? ORDER BY created_at DESC LIMIT 1")
            .bind(task_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_image).transpose()
    }

    async fn commit_ready(&self, image_id: Uuid, assets: &ImageAssets) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(DomainError::from)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query("DELETE FROM image_variant WHERE image_id = ?")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;
        for variant in &assets.variants {
            sqlx::query(
                "INSERT INTO image_variant (image_id, preset, path, size_bytes, width, height) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(variant.image_id.to_string())
            .bind(variant.preset.as_str())
            .bind(&variant.path)
            .bind(variant.size_bytes as i64)
            .bind(i64::from(variant.width))
            .bind(i64::from(variant.height))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM image_tag WHERE image_id = ?")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;
        for tag in &assets.tags {
            sqlx::query("INSERT INTO image_tag (image_id, tag, confidence, source) VALUES (?, ?, ?, ?)")
                .bind(tag.image_id.to_string())
                .bind(&tag.tag)
                .bind(f64::from(tag.confidence))
                .bind(tag.source.as_str())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM image_description WHERE image_id = ?")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO image_description (image_id, description, analysis, model) VALUES (?, ?, ?, ?)")
            .bind(assets.description.image_id.to_string())
            .bind(&assets.description.description)
            .bind(&assets.description.analysis)
            .bind(&assets.description.model)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM image_color WHERE image_id = ?")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;
        for color in &assets.colors {
            sqlx::query("INSERT INTO image_color (image_id, hex, percentage, is_dominant) VALUES (?, ?, ?, ?)")
                .bind(color.image_id.to_string())
                .bind(&color.hex)
                .bind(f64::from(color.percentage))
                .bind(color.is_dominant)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM image_embedding WHERE image_id = ?")
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;
        let vector_json = serde_json::to_string(&assets.embedding.vector).map_err(DomainError::from)?;
        sqlx::query("INSERT INTO image_embedding (image_id, vector, model) VALUES (?, ?, ?)")
            .bind(assets.embedding.image_id.to_string())
            .bind(vector_json)
            .bind(&assets.embedding.model)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE image SET status = 'ready', updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(image_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(DomainError::from)?;
        Ok(())
    }

    async fn mark_for_cleanup(&self, image_id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE image SET pending_cleanup = 1, updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(image_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Loads the full asset bundle for a `ready` image, used by the status API's
/// job-detail endpoint. Not part of the `ImageRepository` port because only
/// the read side needs it; kept alongside the repository it reads from.
impl ImageRepositoryImpl {
    pub async fn load_variants(&self, image_id: Uuid) -> DomainResult<Vec<Variant>> {
        let rows = sqlx::query("SELECT * FROM image_variant WHERE image_id = ?")
            .bind(image_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Variant {
                    image_id: Uuid::parse_str(row.get::<String, _>("image_id").as_str())
                        .map_err(|e| DomainError::SerializationError(e.to_string()))?,
                    preset: SizePreset::from_str(row.get::<String, _>("preset").as_str())
                        .ok_or_else(|| DomainError::SerializationError("unknown size preset".into()))?,
                    path: row.get::<String, _>("path"),
                    size_bytes: row.get::<i64, _>("size_bytes") as u64,
                    width: row.get::<i64, _>("width") as u32,
                    height: row.get::<i64, _>("height") as u32,
                })
            })
            .collect()
    }

    pub async fn load_tags(&self, image_id: Uuid) -> DomainResult<Vec<Tag>> {
        let rows = sqlx::query("SELECT * FROM image_tag WHERE image_id = ?")
            .bind(image_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Tag {
                    image_id: Uuid::parse_str(row.get::<String, _>("image_id").as_str())
                        .map_err(|e| DomainError::SerializationError(e.to_string()))?,
                    tag: row.get::<String, _>("tag"),
                    confidence: row.get::<f64, _>("confidence") as f32,
                    source: TagSource::from_str(row.get::<String, _>("source").as_str())
                        .ok_or_else(|| DomainError::SerializationError("unknown tag source".into()))?,
                })
            })
            .collect()
    }

    pub async fn load_description(&self, image_id: Uuid) -> DomainResult<Option<Description>> {
        let row = sqlx::query("SELECT * FROM image_description WHERE image_id = ?")
            .bind(image_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| {
            Ok(Description {
                image_id: Uuid::parse_str(row.get::<String, _>("image_id").as_str())
                    .map_err(|e| DomainError::SerializationError(e.to_string()))?,
                description: row.get::<String, _>("description"),
                analysis: row.get::<Option<String>, _>("analysis"),
                model: row.get::<String, _>("model"),
            })
        })
        .transpose()
    }

    pub async fn load_colors(&self, image_id: Uuid) -> DomainResult<Vec<Color>> {
        let rows = sqlx::query("SELECT * FROM image_color WHERE image_id = ?")
            .bind(image_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Color {
                    image_id: Uuid::parse_str(row.get::<String, _>("image_id").as_str())
                        .map_err(|e| DomainError::SerializationError(e.to_string()))?,
                    hex: row.get::<String, _>("hex"),
                    percentage: row.get::<f64, _>("percentage") as f32,
                    is_dominant: row.get::<i64, _>("is_dominant") != 0,
                })
            })
            .collect()
    }
}

use anyhow::Context;
use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::utils::now_utc;

/// A learner's completion mark for one chapter. One row per
/// `(user, chapter)`; toggling rewrites the row instead of stacking history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct UserProgress {
    pub id: i64,
    pub user_id: String,
    pub chapter_id: i64,
    pub is_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Record whether a learner has completed a chapter. The chapter must be a
/// published chapter of a published course; drafts are invisible to learners.
pub async fn set_chapter_progress(
    database: &SqlitePool,
    user_id: &str,
    course_id: i64,
    chapter_id: i64,
    is_completed: bool,
) -> ApiResult<UserProgress> {
    let visible: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chapter
         JOIN course ON course.id = chapter.course_id
         WHERE chapter.id = ? AND chapter.course_id = ?
           AND chapter.is_published = 1 AND course.is_published = 1",
    )
    .bind(chapter_id)
    .bind(course_id)
    .fetch_one(database)
    .await?;
    if visible == 0 {
        return Err(ApiError::NotFound);
    }
    let now = now_utc();
    sqlx::query(
        "INSERT INTO user_progress (user_id, chapter_id, is_completed, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(user_id, chapter_id) DO UPDATE SET
            is_completed = excluded.is_completed,
            updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(chapter_id)
    .bind(is_completed)
    .bind(now)
    .bind(now)
    .execute(database)
    .await?;
    let row = sqlx::query_as::<_, UserProgress>(
        "SELECT * FROM user_progress WHERE user_id = ? AND chapter_id = ?",
    )
    .bind(user_id)
    .bind(chapter_id)
    .fetch_optional(database)
    .await?
    .context("progress row missing right after upsert")?;
    Ok(row)
}

/// Percentage of a course's published chapters this learner has completed.
///
/// This feeds page decoration, so it never fails: any storage fault degrades
/// the value to 0 and leaves a warning for operators. A course with no
/// published chapters also reads 0.
pub async fn course_progress(database: &SqlitePool, user_id: &str, course_id: i64) -> u8 {
    match completion_percentage(database, user_id, course_id).await {
        Ok(percentage) => percentage,
        Err(err) => {
            tracing::warn!(
                "progress for user {user_id} on course {course_id} degraded to 0: {err:#}"
            );
            0
        }
    }
}

async fn completion_percentage(
    database: &SqlitePool,
    user_id: &str,
    course_id: i64,
) -> anyhow::Result<u8> {
    let published_ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM chapter WHERE course_id = ? AND is_published = 1")
            .bind(course_id)
            .fetch_all(database)
            .await
            .context("list published chapters")?;
    if published_ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; published_ids.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM user_progress
         WHERE user_id = ? AND is_completed = 1 AND chapter_id IN ({placeholders})"
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(user_id);
    for id in &published_ids {
        query = query.bind(id);
    }
    let completed = query
        .fetch_one(database)
        .await
        .context("count completed chapters")?;
    let percentage = (completed as f64 / published_ids.len() as f64) * 100.0;
    Ok(percentage.round() as u8)
}

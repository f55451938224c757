use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::course;
use crate::error::{ApiError, ApiResult};
use crate::utils::now_utc;
use crate::video;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Chapter {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    /// Display rank inside the course. Ascending reads give the author's order;
    /// the values themselves carry no other meaning.
    pub position: i64,
    pub is_published: bool,
    pub is_free: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub is_free: Option<bool>,
}

/// One entry of a reorder request: which chapter goes to which rank.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChapterPosition {
    pub id: i64,
    pub position: i64,
}

/// New chapters are appended after the current last position, so creation
/// order is display order until the author reorders.
pub async fn create(
    database: &SqlitePool,
    course_id: i64,
    owner_id: &str,
    title: &str,
) -> ApiResult<Chapter> {
    course::get_owned(database, course_id, owner_id).await?;
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    let position: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(position) + 1, 0) FROM chapter WHERE course_id = ?")
            .bind(course_id)
            .fetch_one(database)
            .await?;
    let now = now_utc();
    let result = sqlx::query(
        "INSERT INTO chapter (course_id, title, position, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(course_id)
    .bind(title)
    .bind(position)
    .bind(now)
    .bind(now)
    .execute(database)
    .await?;
    get(database, course_id, result.last_insert_rowid()).await
}

pub async fn list(database: &SqlitePool, course_id: i64) -> ApiResult<Vec<Chapter>> {
    Ok(sqlx::query_as::<_, Chapter>(
        "SELECT * FROM chapter WHERE course_id = ? ORDER BY position ASC, id ASC",
    )
    .bind(course_id)
    .fetch_all(database)
    .await?)
}

pub async fn list_published(database: &SqlitePool, course_id: i64) -> ApiResult<Vec<Chapter>> {
    Ok(sqlx::query_as::<_, Chapter>(
        "SELECT * FROM chapter WHERE course_id = ? AND is_published = 1 ORDER BY position ASC, id ASC",
    )
    .bind(course_id)
    .fetch_all(database)
    .await?)
}

async fn get(database: &SqlitePool, course_id: i64, chapter_id: i64) -> ApiResult<Chapter> {
    sqlx::query_as::<_, Chapter>("SELECT * FROM chapter WHERE id = ? AND course_id = ?")
        .bind(chapter_id)
        .bind(course_id)
        .fetch_optional(database)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn get_owned(
    database: &SqlitePool,
    course_id: i64,
    chapter_id: i64,
    owner_id: &str,
) -> ApiResult<Chapter> {
    course::get_owned(database, course_id, owner_id).await?;
    get(database, course_id, chapter_id).await
}

pub async fn count_published(database: &SqlitePool, course_id: i64) -> ApiResult<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM chapter WHERE course_id = ? AND is_published = 1")
            .bind(course_id)
            .fetch_one(database)
            .await?,
    )
}

/// Setting a new video URL re-registers the chapter with the transcoder,
/// replacing any previous asset record.
pub async fn update(
    database: &SqlitePool,
    course_id: i64,
    chapter_id: i64,
    owner_id: &str,
    update: &ChapterUpdate,
) -> ApiResult<Chapter> {
    get_owned(database, course_id, chapter_id, owner_id).await?;
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
    }
    if let Some(video_url) = &update.video_url {
        if video_url.trim().is_empty() {
            return Err(ApiError::Validation("Video URL is required".to_string()));
        }
    }
    sqlx::query(
        "UPDATE chapter SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            video_url = COALESCE(?, video_url),
            is_free = COALESCE(?, is_free),
            updated_at = ?
         WHERE id = ? AND course_id = ?",
    )
    .bind(update.title.as_deref().map(str::trim))
    .bind(update.description.as_deref())
    .bind(update.video_url.as_deref().map(str::trim))
    .bind(update.is_free)
    .bind(now_utc())
    .bind(chapter_id)
    .bind(course_id)
    .execute(database)
    .await?;
    if update.video_url.is_some() {
        video::register_asset(database, chapter_id).await?;
    }
    get(database, course_id, chapter_id).await
}

/// Publish gate: title, description and video must all be present and the
/// video already registered with the transcoder.
pub async fn publish(
    database: &SqlitePool,
    course_id: i64,
    chapter_id: i64,
    owner_id: &str,
) -> ApiResult<Chapter> {
    let chapter = get_owned(database, course_id, chapter_id, owner_id).await?;
    let asset = video::for_chapter(database, chapter_id).await?;
    let complete = !chapter.title.trim().is_empty()
        && !course::is_blank(&chapter.description)
        && !course::is_blank(&chapter.video_url)
        && asset.is_some();
    if !complete {
        return Err(ApiError::missing_fields());
    }
    sqlx::query("UPDATE chapter SET is_published = 1, updated_at = ? WHERE id = ?")
        .bind(now_utc())
        .bind(chapter_id)
        .execute(database)
        .await?;
    get(database, course_id, chapter_id).await
}

/// Unpublishing the last published chapter takes the course down with it,
/// atomically, so a published course never has zero published chapters.
pub async fn unpublish(
    database: &SqlitePool,
    course_id: i64,
    chapter_id: i64,
    owner_id: &str,
) -> ApiResult<Chapter> {
    get_owned(database, course_id, chapter_id, owner_id).await?;
    let now = now_utc();
    let mut tx = database.begin().await?;
    sqlx::query("UPDATE chapter SET is_published = 0, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(chapter_id)
        .execute(&mut *tx)
        .await?;
    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM chapter WHERE course_id = ? AND is_published = 1")
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await?;
    if remaining == 0 {
        sqlx::query("UPDATE course SET is_published = 0, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    get(database, course_id, chapter_id).await
}

/// Apply an author's drag-and-drop result. All writes ride one transaction:
/// either every entry lands or none does, so a crash mid-way cannot leave a
/// half-reordered course. An entry naming a chapter outside the course rolls
/// the whole batch back.
pub async fn reorder(
    database: &SqlitePool,
    course_id: i64,
    owner_id: &str,
    items: &[ChapterPosition],
) -> ApiResult<()> {
    course::get_owned(database, course_id, owner_id).await?;
    let now = now_utc();
    let mut tx = database.begin().await?;
    for item in items {
        let result = sqlx::query(
            "UPDATE chapter SET position = ?, updated_at = ? WHERE id = ? AND course_id = ?",
        )
        .bind(item.position)
        .bind(now)
        .bind(item.id)
        .bind(course_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::Validation(format!(
                "Chapter {} is not part of this course",
                item.id
            )));
        }
    }
    tx.commit().await?;
    Ok(())
}

pub mod catalog;
pub mod chapter;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::utils::now_utc;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Course {
    pub id: i64,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
}

/// Owner view of a course together with its chapters in display order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub chapters: Vec<chapter::Chapter>,
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

pub async fn create(database: &SqlitePool, owner_id: &str, title: &str) -> ApiResult<Course> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    let now = now_utc();
    let result =
        sqlx::query("INSERT INTO course (owner_id, title, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(owner_id)
            .bind(title)
            .bind(now)
            .bind(now)
            .execute(database)
            .await?;
    get_owned(database, result.last_insert_rowid(), owner_id).await
}

/// Resolve a course by `(id, owner)`. Absent and not-owned collapse into one
/// outcome, so callers cannot probe for existence.
pub async fn get_owned(database: &SqlitePool, course_id: i64, owner_id: &str) -> ApiResult<Course> {
    sqlx::query_as::<_, Course>("SELECT * FROM course WHERE id = ? AND owner_id = ?")
        .bind(course_id)
        .bind(owner_id)
        .fetch_optional(database)
        .await?
        .ok_or(ApiError::NotFound)
}

pub async fn list_owned(database: &SqlitePool, owner_id: &str) -> ApiResult<Vec<Course>> {
    Ok(sqlx::query_as::<_, Course>(
        "SELECT * FROM course WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(owner_id)
    .fetch_all(database)
    .await?)
}

pub async fn get_detail(
    database: &SqlitePool,
    course_id: i64,
    owner_id: &str,
) -> ApiResult<CourseDetail> {
    let course = get_owned(database, course_id, owner_id).await?;
    let chapters = chapter::list(database, course_id).await?;
    Ok(CourseDetail { course, chapters })
}

pub async fn update(
    database: &SqlitePool,
    course_id: i64,
    owner_id: &str,
    update: &CourseUpdate,
) -> ApiResult<Course> {
    get_owned(database, course_id, owner_id).await?;
    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
    }
    if let Some(category_id) = update.category_id {
        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category WHERE id = ?")
            .bind(category_id)
            .fetch_one(database)
            .await?;
        if known == 0 {
            return Err(ApiError::Validation("Unknown category".to_string()));
        }
    }
    sqlx::query(
        "UPDATE course SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            image_url = COALESCE(?, image_url),
            price = COALESCE(?, price),
            category_id = COALESCE(?, category_id),
            updated_at = ?
         WHERE id = ? AND owner_id = ?",
    )
    .bind(update.title.as_deref().map(str::trim))
    .bind(update.description.as_deref())
    .bind(update.image_url.as_deref())
    .bind(update.price)
    .bind(update.category_id)
    .bind(now_utc())
    .bind(course_id)
    .bind(owner_id)
    .execute(database)
    .await?;
    get_owned(database, course_id, owner_id).await
}

/// Publish gate: title, description, image and category must all be present
/// and at least one chapter already published.
pub async fn publish(database: &SqlitePool, course_id: i64, owner_id: &str) -> ApiResult<Course> {
    let course = get_owned(database, course_id, owner_id).await?;
    let published_chapters = chapter::count_published(database, course_id).await?;
    let complete = !course.title.trim().is_empty()
        && !is_blank(&course.description)
        && !is_blank(&course.image_url)
        && course.category_id.is_some()
        && published_chapters > 0;
    if !complete {
        return Err(ApiError::missing_fields());
    }
    set_published(database, course_id, owner_id, true).await
}

/// Unpublishing has no preconditions beyond ownership.
pub async fn unpublish(database: &SqlitePool, course_id: i64, owner_id: &str) -> ApiResult<Course> {
    get_owned(database, course_id, owner_id).await?;
    set_published(database, course_id, owner_id, false).await
}

async fn set_published(
    database: &SqlitePool,
    course_id: i64,
    owner_id: &str,
    value: bool,
) -> ApiResult<Course> {
    sqlx::query("UPDATE course SET is_published = ?, updated_at = ? WHERE id = ? AND owner_id = ?")
        .bind(value)
        .bind(now_utc())
        .bind(course_id)
        .bind(owner_id)
        .execute(database)
        .await?;
    get_owned(database, course_id, owner_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const OWNER: &str = "instructor_1";

    async fn seed_category(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query("INSERT INTO category (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn insert_chapter(pool: &SqlitePool, course_id: i64, position: i64, published: bool) {
        sqlx::query(
            "INSERT INTO chapter (course_id, title, position, is_published, created_at, updated_at)
             VALUES (?, 'Intro', ?, ?, ?, ?)",
        )
        .bind(course_id)
        .bind(position)
        .bind(published)
        .bind(now_utc())
        .bind(now_utc())
        .execute(pool)
        .await
        .unwrap();
    }

    async fn complete_course(pool: &SqlitePool) -> Course {
        let category_id = seed_category(pool, "Engineering").await;
        let course = create(pool, OWNER, "Rust from scratch").await.unwrap();
        update(
            pool,
            course.id,
            OWNER,
            &CourseUpdate {
                description: Some("Systems programming, from zero".to_string()),
                image_url: Some("https://img.example/rust.png".to_string()),
                category_id: Some(category_id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_requires_title_and_records_owner() {
        let pool = db::connect_in_memory().await.unwrap();
        let err = create(&pool, OWNER, "   ").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let course = create(&pool, OWNER, "  Rust 101 ").await.unwrap();
        assert_eq!(course.title, "Rust 101");
        assert_eq!(course.owner_id, OWNER);
        assert!(!course.is_published);
    }

    #[tokio::test]
    async fn ownership_miss_and_absence_are_one_outcome() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = create(&pool, OWNER, "Rust 101").await.unwrap();

        let not_owned = get_owned(&pool, course.id, "someone_else").await.unwrap_err();
        let absent = get_owned(&pool, 999_999, OWNER).await.unwrap_err();
        assert!(matches!(not_owned, ApiError::NotFound));
        assert!(matches!(absent, ApiError::NotFound));
    }

    #[tokio::test]
    async fn update_applies_only_provided_fields() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = create(&pool, OWNER, "Rust 101").await.unwrap();

        let updated = update(
            &pool,
            course.id,
            OWNER,
            &CourseUpdate {
                price: Some(49.99),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.price, Some(49.99));
        assert_eq!(updated.title, "Rust 101");
        assert!(updated.description.is_none());
    }

    #[tokio::test]
    async fn update_rejects_unknown_category() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = create(&pool, OWNER, "Rust 101").await.unwrap();
        let err = update(
            &pool,
            course.id,
            OWNER,
            &CourseUpdate {
                category_id: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn publish_rejects_missing_fields_even_with_published_chapter() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = create(&pool, OWNER, "Rust 101").await.unwrap();
        insert_chapter(&pool, course.id, 0, true).await;

        let err = publish(&pool, course.id, OWNER).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "Missing required fields"));
    }

    #[tokio::test]
    async fn publish_rejects_course_without_published_chapter() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = complete_course(&pool).await;
        insert_chapter(&pool, course.id, 0, false).await;

        let err = publish(&pool, course.id, OWNER).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "Missing required fields"));
    }

    #[tokio::test]
    async fn publish_succeeds_when_complete() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = complete_course(&pool).await;
        insert_chapter(&pool, course.id, 0, true).await;

        let published = publish(&pool, course.id, OWNER).await.unwrap();
        assert!(published.is_published);
    }

    #[tokio::test]
    async fn unpublish_is_unconditional_for_the_owner() {
        let pool = db::connect_in_memory().await.unwrap();
        let course = complete_course(&pool).await;
        insert_chapter(&pool, course.id, 0, true).await;
        publish(&pool, course.id, OWNER).await.unwrap();

        let course = unpublish(&pool, course.id, OWNER).await.unwrap();
        assert!(!course.is_published);

        // and again, from the already-unpublished state
        let course = unpublish(&pool, course.id, OWNER).await.unwrap();
        assert!(!course.is_published);
    }
}

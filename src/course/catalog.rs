use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::course::{Course, chapter};
use crate::error::{ApiError, ApiResult};
use crate::learner;
use crate::search::CatalogFilter;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Accounting",
    "Computer Science",
    "Engineering",
    "Filming",
    "Fitness",
    "Music",
    "Photography",
];

/// Seed the category table on first boot; reruns are no-ops.
pub async fn ensure_default_categories(database: &SqlitePool) -> ApiResult<()> {
    for name in DEFAULT_CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO category (name) VALUES (?)")
            .bind(name)
            .execute(database)
            .await?;
    }
    Ok(())
}

pub async fn list_categories(database: &SqlitePool) -> ApiResult<Vec<Category>> {
    Ok(
        sqlx::query_as::<_, Category>("SELECT * FROM category ORDER BY name ASC")
            .fetch_all(database)
            .await?,
    )
}

/// One card on the browse page. `progress` is present only for an identified
/// viewer; the listing itself is public.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct CatalogCourse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub chapter_count: i64,
    #[sqlx(default)]
    pub progress: Option<u8>,
}

/// Learner view of one published course: only published chapters are listed.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogCourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub chapters: Vec<chapter::Chapter>,
    pub progress: Option<u8>,
}

fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Browse published courses, newest first, filtered by title substring
/// (case-insensitive) and category.
pub async fn search_published(
    database: &SqlitePool,
    filter: &CatalogFilter,
    viewer: Option<&str>,
) -> ApiResult<Vec<CatalogCourse>> {
    let title = filter.title.trim();
    let mut sql = String::from(
        "SELECT course.id, course.title, course.description, course.image_url, course.price,
                category.name AS category,
                (SELECT COUNT(*) FROM chapter
                  WHERE chapter.course_id = course.id AND chapter.is_published = 1) AS chapter_count
         FROM course
         LEFT JOIN category ON category.id = course.category_id
         WHERE course.is_published = 1",
    );
    if !title.is_empty() {
        sql.push_str(" AND course.title LIKE ? ESCAPE '\\'");
    }
    if filter.category_id.is_some() {
        sql.push_str(" AND course.category_id = ?");
    }
    sql.push_str(" ORDER BY course.created_at DESC, course.id DESC");

    let mut query = sqlx::query_as::<_, CatalogCourse>(&sql);
    if !title.is_empty() {
        query = query.bind(format!("%{}%", escape_like(title)));
    }
    if let Some(category_id) = filter.category_id {
        query = query.bind(category_id);
    }
    let mut courses = query.fetch_all(database).await?;

    if let Some(user_id) = viewer {
        for course in &mut courses {
            course.progress = Some(learner::course_progress(database, user_id, course.id).await);
        }
    }
    Ok(courses)
}

pub async fn get_published(
    database: &SqlitePool,
    course_id: i64,
    viewer: Option<&str>,
) -> ApiResult<CatalogCourseDetail> {
    let course =
        sqlx::query_as::<_, Course>("SELECT * FROM course WHERE id = ? AND is_published = 1")
            .bind(course_id)
            .fetch_optional(database)
            .await?
            .ok_or(ApiError::NotFound)?;
    let chapters = chapter::list_published(database, course_id).await?;
    let progress = match viewer {
        Some(user_id) => Some(learner::course_progress(database, user_id, course_id).await),
        None => None,
    };
    Ok(CatalogCourseDetail { course, chapters, progress })
}

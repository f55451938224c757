use axum::{
    Router,
    extract::{Json, Path, State},
    routing::{get, patch, post, put},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::auth::Identity;
use crate::course::chapter::{self, Chapter, ChapterPosition, ChapterUpdate};
use crate::course::{self, Course, CourseDetail, CourseUpdate};
use crate::error::ApiResult;

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateChapterRequest {
    pub title: String,
}

/// The author's new arrangement. May cover a subset of the course's chapters;
/// entries outside the course fail the whole request.
#[derive(Deserialize, ToSchema)]
pub struct ReorderRequest {
    pub list: Vec<ChapterPosition>,
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses",
    method(post),
    request_body = CreateCourseRequest,
    responses(
        (status = 200, description = "Course created", body = Course),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateCourseRequest>,
) -> ApiResult<Json<Course>> {
    let course = course::create(&state.database, &identity.user_id, &req.title).await?;
    Ok(Json(course))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses",
    method(get),
    responses(
        (status = 200, description = "The caller's courses, newest first", body = Vec<Course>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_courses(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Json<Vec<Course>>> {
    let courses = course::list_owned(&state.database, &identity.user_id).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}",
    method(get),
    params(
        ("course_id" = i64, Path, description = "Course to fetch")
    ),
    responses(
        (status = 200, description = "Course with its chapters in display order", body = CourseDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
) -> ApiResult<Json<CourseDetail>> {
    let detail = course::get_detail(&state.database, course_id, &identity.user_id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}",
    method(patch),
    params(
        ("course_id" = i64, Path, description = "Course to update")
    ),
    request_body = CourseUpdate,
    responses(
        (status = 200, description = "Updated course", body = Course),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn update_course(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
    Json(update): Json<CourseUpdate>,
) -> ApiResult<Json<Course>> {
    let course = course::update(&state.database, course_id, &identity.user_id, &update).await?;
    Ok(Json(course))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/publish",
    method(patch),
    params(
        ("course_id" = i64, Path, description = "Course to publish")
    ),
    responses(
        (status = 200, description = "Published course", body = Course),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn publish_course(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
) -> ApiResult<Json<Course>> {
    let course = course::publish(&state.database, course_id, &identity.user_id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/unpublish",
    method(patch),
    params(
        ("course_id" = i64, Path, description = "Course to unpublish")
    ),
    responses(
        (status = 200, description = "Unpublished course", body = Course),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn unpublish_course(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
) -> ApiResult<Json<Course>> {
    let course = course::unpublish(&state.database, course_id, &identity.user_id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters",
    method(post),
    params(
        ("course_id" = i64, Path, description = "Course to add the chapter to")
    ),
    request_body = CreateChapterRequest,
    responses(
        (status = 200, description = "Chapter appended at the end", body = Chapter),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Course not found or not owned")
    )
)]
pub async fn create_chapter(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
    Json(req): Json<CreateChapterRequest>,
) -> ApiResult<Json<Chapter>> {
    let chapter =
        chapter::create(&state.database, course_id, &identity.user_id, &req.title).await?;
    Ok(Json(chapter))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters/reorder",
    method(put),
    params(
        ("course_id" = i64, Path, description = "Course whose chapters to rearrange")
    ),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Chapters in the new display order", body = Vec<Chapter>),
        (status = 400, description = "An entry is not part of this course"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Course not found or not owned")
    )
)]
pub async fn reorder_chapters(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Chapter>>> {
    chapter::reorder(&state.database, course_id, &identity.user_id, &req.list).await?;
    let chapters = chapter::list(&state.database, course_id).await?;
    Ok(Json(chapters))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters/{chapter_id}",
    method(get),
    params(
        ("course_id" = i64, Path, description = "Course the chapter belongs to"),
        ("chapter_id" = i64, Path, description = "Chapter to fetch")
    ),
    responses(
        (status = 200, description = "The chapter", body = Chapter),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn get_chapter(
    State(state): State<AppState>,
    identity: Identity,
    Path((course_id, chapter_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Chapter>> {
    let chapter =
        chapter::get_owned(&state.database, course_id, chapter_id, &identity.user_id).await?;
    Ok(Json(chapter))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters/{chapter_id}",
    method(patch),
    params(
        ("course_id" = i64, Path, description = "Course the chapter belongs to"),
        ("chapter_id" = i64, Path, description = "Chapter to update")
    ),
    request_body = ChapterUpdate,
    responses(
        (status = 200, description = "Updated chapter", body = Chapter),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn update_chapter(
    State(state): State<AppState>,
    identity: Identity,
    Path((course_id, chapter_id)): Path<(i64, i64)>,
    Json(update): Json<ChapterUpdate>,
) -> ApiResult<Json<Chapter>> {
    let chapter = chapter::update(
        &state.database,
        course_id,
        chapter_id,
        &identity.user_id,
        &update,
    )
    .await?;
    Ok(Json(chapter))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters/{chapter_id}/publish",
    method(patch),
    params(
        ("course_id" = i64, Path, description = "Course the chapter belongs to"),
        ("chapter_id" = i64, Path, description = "Chapter to publish")
    ),
    responses(
        (status = 200, description = "Published chapter", body = Chapter),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn publish_chapter(
    State(state): State<AppState>,
    identity: Identity,
    Path((course_id, chapter_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Chapter>> {
    let chapter =
        chapter::publish(&state.database, course_id, chapter_id, &identity.user_id).await?;
    Ok(Json(chapter))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters/{chapter_id}/unpublish",
    method(patch),
    params(
        ("course_id" = i64, Path, description = "Course the chapter belongs to"),
        ("chapter_id" = i64, Path, description = "Chapter to unpublish")
    ),
    responses(
        (status = 200, description = "Unpublished chapter", body = Chapter),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn unpublish_chapter(
    State(state): State<AppState>,
    identity: Identity,
    Path((course_id, chapter_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Chapter>> {
    let chapter =
        chapter::unpublish(&state.database, course_id, chapter_id, &identity.user_id).await?;
    Ok(Json(chapter))
}

pub fn get_instructor_scope() -> Router<AppState> {
    Router::new()
        .route("/courses", post(create_course).get(list_courses))
        .route("/courses/{course_id}", get(get_course).patch(update_course))
        .route("/courses/{course_id}/publish", patch(publish_course))
        .route("/courses/{course_id}/unpublish", patch(unpublish_course))
        .route("/courses/{course_id}/chapters", post(create_chapter))
        .route("/courses/{course_id}/chapters/reorder", put(reorder_chapters))
        .route(
            "/courses/{course_id}/chapters/{chapter_id}",
            get(get_chapter).patch(update_chapter),
        )
        .route(
            "/courses/{course_id}/chapters/{chapter_id}/publish",
            patch(publish_chapter),
        )
        .route(
            "/courses/{course_id}/chapters/{chapter_id}/unpublish",
            patch(unpublish_chapter),
        )
}

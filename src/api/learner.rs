use axum::{
    Router,
    extract::{Json, Path, State},
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::auth::Identity;
use crate::error::ApiResult;
use crate::learner::{self, UserProgress};

#[derive(Deserialize, ToSchema)]
pub struct ProgressRequest {
    pub is_completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct CourseProgressResponse {
    /// Completed share of the course's published chapters, 0 to 100.
    pub progress: u8,
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/chapters/{chapter_id}/progress",
    method(put),
    params(
        ("course_id" = i64, Path, description = "Course the chapter belongs to"),
        ("chapter_id" = i64, Path, description = "Chapter to mark")
    ),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "The caller's completion mark", body = UserProgress),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such published chapter")
    )
)]
pub async fn set_chapter_progress(
    State(state): State<AppState>,
    identity: Identity,
    Path((course_id, chapter_id)): Path<(i64, i64)>,
    Json(req): Json<ProgressRequest>,
) -> ApiResult<Json<UserProgress>> {
    let progress = learner::set_chapter_progress(
        &state.database,
        &identity.user_id,
        course_id,
        chapter_id,
        req.is_completed,
    )
    .await?;
    Ok(Json(progress))
}

#[utoipa::path(
    context_path = "/api",
    path = "/courses/{course_id}/progress",
    method(get),
    params(
        ("course_id" = i64, Path, description = "Course to read progress for")
    ),
    responses(
        (status = 200, description = "The caller's completion percentage", body = CourseProgressResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_course_progress(
    State(state): State<AppState>,
    identity: Identity,
    Path(course_id): Path<i64>,
) -> ApiResult<Json<CourseProgressResponse>> {
    let progress = learner::course_progress(&state.database, &identity.user_id, course_id).await;
    Ok(Json(CourseProgressResponse { progress }))
}

pub fn get_learner_scope() -> Router<AppState> {
    Router::new()
        .route(
            "/courses/{course_id}/chapters/{chapter_id}/progress",
            put(set_chapter_progress),
        )
        .route("/courses/{course_id}/progress", get(get_course_progress))
}

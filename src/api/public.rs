use axum::{
    Router,
    extract::{Json, Path, Query, State},
    routing::get,
};

use crate::api::AppState;
use crate::auth::MaybeIdentity;
use crate::course::catalog::{self, CatalogCourse, CatalogCourseDetail, Category};
use crate::error::ApiResult;
use crate::search::CatalogFilter;

#[utoipa::path(
    context_path = "/api",
    path = "/catalog/courses",
    method(get),
    params(CatalogFilter),
    responses(
        (status = 200, description = "Published courses, newest first", body = Vec<CatalogCourse>)
    )
)]
pub async fn browse_courses(
    State(state): State<AppState>,
    MaybeIdentity(viewer): MaybeIdentity,
    Query(filter): Query<CatalogFilter>,
) -> ApiResult<Json<Vec<CatalogCourse>>> {
    let courses = catalog::search_published(&state.database, &filter, viewer.as_deref()).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    context_path = "/api",
    path = "/catalog/courses/{course_id}",
    method(get),
    params(
        ("course_id" = i64, Path, description = "Published course to fetch")
    ),
    responses(
        (status = 200, description = "The course with its published chapters", body = CatalogCourseDetail),
        (status = 404, description = "Not found or not published")
    )
)]
pub async fn get_catalog_course(
    State(state): State<AppState>,
    MaybeIdentity(viewer): MaybeIdentity,
    Path(course_id): Path<i64>,
) -> ApiResult<Json<CatalogCourseDetail>> {
    let detail = catalog::get_published(&state.database, course_id, viewer.as_deref()).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    context_path = "/api",
    path = "/categories",
    method(get),
    responses(
        (status = 200, description = "All categories, alphabetical", body = Vec<Category>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = catalog::list_categories(&state.database).await?;
    Ok(Json(categories))
}

pub fn get_public_scope() -> Router<AppState> {
    Router::new()
        .nest(
            "/catalog",
            Router::new()
                .route("/courses", get(browse_courses))
                .route("/courses/{course_id}", get(get_catalog_course)),
        )
        .route("/categories", get(list_categories))
}

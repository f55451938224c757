pub mod instructor;
pub mod learner;
pub mod public;

use axum::Router;
use sqlx::SqlitePool;
use utoipa::OpenApi;

#[derive(Debug, Clone)]
pub struct AppState {
    pub database: SqlitePool,
}

#[derive(OpenApi)]
#[openapi(paths(
    instructor::create_course,
    instructor::list_courses,
    instructor::get_course,
    instructor::update_course,
    instructor::publish_course,
    instructor::unpublish_course,
    instructor::create_chapter,
    instructor::reorder_chapters,
    instructor::get_chapter,
    instructor::update_chapter,
    instructor::publish_chapter,
    instructor::unpublish_chapter,
    learner::set_chapter_progress,
    learner::get_course_progress,
    public::browse_courses,
    public::get_catalog_course,
    public::list_categories,
))]
pub struct ApiDoc;

pub fn get_openapi_json() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .expect("openapi document serializes")
}

/// Everything under `/api`: the instructor authoring surface, the learner
/// progress surface and the public catalog.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(instructor::get_instructor_scope())
                .merge(learner::get_learner_scope())
                .merge(public::get_public_scope()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::USER_ID_HEADER;
    use crate::course::Course;
    use crate::course::catalog;
    use crate::course::chapter::Chapter;
    use crate::db;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const INSTRUCTOR: &str = "instructor_1";
    const LEARNER: &str = "learner_1";

    async fn test_router() -> Router {
        let database = db::connect_in_memory().await.unwrap();
        catalog::ensure_default_categories(&database).await.unwrap();
        api_router(AppState { database })
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
        router.clone().oneshot(req).await.unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn read_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn first_category_id(router: &Router) -> i64 {
        let response = send(router, request("GET", "/api/categories", None, None)).await;
        let categories: Value = read_json(response).await;
        categories[0]["id"].as_i64().unwrap()
    }

    /// Drive the full authoring flow over HTTP: a course with `chapters`
    /// published chapters, itself published.
    async fn publish_course(router: &Router, title: &str, chapters: usize) -> (i64, Vec<i64>) {
        let response = send(
            router,
            request("POST", "/api/courses", Some(INSTRUCTOR), Some(json!({ "title": title }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let course: Course = read_json(response).await;

        let category_id = first_category_id(router).await;
        let response = send(
            router,
            request(
                "PATCH",
                &format!("/api/courses/{}", course.id),
                Some(INSTRUCTOR),
                Some(json!({
                    "description": "From zero to shippable",
                    "image_url": "https://img.example/cover.png",
                    "category_id": category_id,
                })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut chapter_ids = Vec::new();
        for index in 0..chapters {
            let response = send(
                router,
                request(
                    "POST",
                    &format!("/api/courses/{}/chapters", course.id),
                    Some(INSTRUCTOR),
                    Some(json!({ "title": format!("Chapter {index}") })),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            let chapter: Chapter = read_json(response).await;

            let response = send(
                router,
                request(
                    "PATCH",
                    &format!("/api/courses/{}/chapters/{}", course.id, chapter.id),
                    Some(INSTRUCTOR),
                    Some(json!({
                        "description": "What this chapter covers",
                        "video_url": "https://cdn.example/clip.mp4",
                    })),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);

            let response = send(
                router,
                request(
                    "PATCH",
                    &format!("/api/courses/{}/chapters/{}/publish", course.id, chapter.id),
                    Some(INSTRUCTOR),
                    None,
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            chapter_ids.push(chapter.id);
        }

        let response = send(
            router,
            request(
                "PATCH",
                &format!("/api/courses/{}/publish", course.id),
                Some(INSTRUCTOR),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        (course.id, chapter_ids)
    }

    #[tokio::test]
    async fn authoring_requires_identity() {
        let router = test_router().await;

        let response = send(
            &router,
            request("POST", "/api/courses", None, Some(json!({ "title": "Rust" }))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&router, request("GET", "/api/courses", None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn incomplete_course_cannot_publish() {
        let router = test_router().await;
        let response = send(
            &router,
            request("POST", "/api/courses", Some(INSTRUCTOR), Some(json!({ "title": "Rust" }))),
        )
        .await;
        let course: Course = read_json(response).await;

        let response = send(
            &router,
            request(
                "PATCH",
                &format!("/api/courses/{}/publish", course.id),
                Some(INSTRUCTOR),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_text(response).await, "Missing required fields");
    }

    #[tokio::test]
    async fn foreign_courses_read_as_not_found() {
        let router = test_router().await;
        let (course_id, _) = publish_course(&router, "Rust", 1).await;

        let response = send(
            &router,
            request(
                "GET",
                &format!("/api/courses/{course_id}"),
                Some("someone_else"),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reorder_round_trips_over_http() {
        let router = test_router().await;
        let (course_id, chapters) = publish_course(&router, "Rust", 3).await;
        let (a, b, c) = (chapters[0], chapters[1], chapters[2]);

        let response = send(
            &router,
            request(
                "PUT",
                &format!("/api/courses/{course_id}/chapters/reorder"),
                Some(INSTRUCTOR),
                Some(json!({ "list": [
                    { "id": b, "position": 0 },
                    { "id": a, "position": 1 },
                    { "id": c, "position": 2 },
                ]})),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let chapters: Vec<Chapter> = read_json(response).await;
        let ids: Vec<i64> = chapters.iter().map(|chapter| chapter.id).collect();
        assert_eq!(ids, [b, a, c]);
    }

    #[tokio::test]
    async fn learner_progress_flow() {
        let router = test_router().await;
        let (course_id, chapters) = publish_course(&router, "Rust", 2).await;

        let response = send(
            &router,
            request(
                "PUT",
                &format!("/api/courses/{course_id}/chapters/{}/progress", chapters[0]),
                Some(LEARNER),
                Some(json!({ "is_completed": true })),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let mark: Value = read_json(response).await;
        assert_eq!(mark["is_completed"], json!(true));

        let response = send(
            &router,
            request(
                "GET",
                &format!("/api/courses/{course_id}/progress"),
                Some(LEARNER),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let summary: Value = read_json(response).await;
        assert_eq!(summary["progress"], json!(50));
    }

    #[tokio::test]
    async fn catalog_serves_everyone_and_personalizes() {
        let router = test_router().await;
        let (course_id, chapters) = publish_course(&router, "Published Rust", 2).await;
        // a draft stays invisible
        send(
            &router,
            request("POST", "/api/courses", Some(INSTRUCTOR), Some(json!({ "title": "Draft" }))),
        )
        .await;
        send(
            &router,
            request(
                "PUT",
                &format!("/api/courses/{course_id}/chapters/{}/progress", chapters[0]),
                Some(LEARNER),
                Some(json!({ "is_completed": true })),
            ),
        )
        .await;

        let response = send(&router, request("GET", "/api/catalog/courses", None, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cards: Value = read_json(response).await;
        assert_eq!(cards.as_array().unwrap().len(), 1);
        assert_eq!(cards[0]["title"], json!("Published Rust"));
        assert_eq!(cards[0]["chapter_count"], json!(2));
        assert_eq!(cards[0]["progress"], Value::Null);

        let response = send(
            &router,
            request("GET", "/api/catalog/courses", Some(LEARNER), None),
        )
        .await;
        let cards: Value = read_json(response).await;
        assert_eq!(cards[0]["progress"], json!(50));

        let response = send(
            &router,
            request(
                "GET",
                &format!("/api/catalog/courses?title={}", "published"),
                None,
                None,
            ),
        )
        .await;
        let cards: Value = read_json(response).await;
        assert_eq!(cards.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalog_ignores_empty_filter_params() {
        let router = test_router().await;
        publish_course(&router, "Rust", 1).await;

        let response = send(
            &router,
            request("GET", "/api/catalog/courses?title=&category_id=", None, None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cards: Value = read_json(response).await;
        assert_eq!(cards.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalog_detail_lists_published_chapters_only() {
        let router = test_router().await;
        let (course_id, _) = publish_course(&router, "Rust", 2).await;
        // append a draft chapter
        send(
            &router,
            request(
                "POST",
                &format!("/api/courses/{course_id}/chapters"),
                Some(INSTRUCTOR),
                Some(json!({ "title": "Draft chapter" })),
            ),
        )
        .await;

        let response = send(
            &router,
            request("GET", &format!("/api/catalog/courses/{course_id}"), None, None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let detail: Value = read_json(response).await;
        assert_eq!(detail["chapters"].as_array().unwrap().len(), 2);

        let response = send(
            &router,
            request("GET", "/api/catalog/courses/999999", None, None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

use axum::{
    Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use std::sync::Arc;

use crate::db::services;
use crate::web::extract::Json;
use crate::web::models::{CurrentUser, TagResponse, UpdateTagRequest};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn list_tags_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<TagResponse>>, AppError> {
    let tags = services::list_tags(&app_state.db, current_user.id).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

async fn update_tag_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
    Json(payload): Json<UpdateTagRequest>,
) -> Result<Json<TagResponse>, AppError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Tag name must not be empty.".to_string(),
            ));
        }
    }

    let updated = services::update_tag(&app_state.db, tag_id, current_user.id, payload.name)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

    Ok(Json(TagResponse::from(updated)))
}

async fn delete_tag_handler(
    Extension(current_user): Extension<CurrentUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected = services::delete_tag(&app_state.db, tag_id, current_user.id).await?;

    if rows_affected > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Tag not found".to_string()))
    }
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler))
        .route(
            "/{tag_id}",
            patch(update_tag_handler).delete(delete_tag_handler),
        )
}

#[cfg(test)]
mod tests {
    use crate::db::entities::tag;
    use crate::web::test_support::{authed_request, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use tower::ServiceExt;

    fn tag_row(id: i32, user_id: i32, name: &str) -> tag::Model {
        tag::Model {
            id,
            user_id,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn listing_tags_requires_authentication() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/tags")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn listing_tags_returns_owned_tags_name_descending() {
        // The service orders by name DESC; the mock feeds rows in that order
        // and the wire body must preserve it.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tag_row(2, 1, "Vegan"), tag_row(1, 1, "Dessert")]])
            .into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(authed_request("GET", "/api/tags", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value[0]["name"], "Vegan");
        assert_eq!(value[1]["name"], "Dessert");
        // Owner ids never leak onto the wire.
        assert!(value[0].get("user_id").is_none());
    }

    #[tokio::test]
    async fn patching_a_tag_changes_its_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tag_row(3, 1, "Brunch")]])
            .append_query_results([vec![tag_row(3, 1, "Dessert")]])
            .into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(authed_request(
                "PATCH",
                "/api/tags/3",
                Some(r#"{"name":"Dessert"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["name"], "Dessert");
    }

    #[tokio::test]
    async fn patching_someone_elses_tag_is_a_404() {
        // The owner-scoped lookup comes back empty whether the tag is absent
        // or belongs to another user; both cases answer 404.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<tag::Model>::new()])
            .into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(authed_request(
                "PATCH",
                "/api/tags/99",
                Some(r#"{"name":"Mine"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patching_with_an_empty_name_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(authed_request(
                "PATCH",
                "/api/tags/3",
                Some(r#"{"name":"  "}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_a_tag_returns_no_content() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(authed_request("DELETE", "/api/tags/3", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn deleting_an_unowned_tag_is_a_404() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let app = test_app(db);

        let response = app
            .oneshot(authed_request("DELETE", "/api/tags/3", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

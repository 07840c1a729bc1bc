use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::models::CommentModel;
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::services::post::PostService;
use crate::utils::render_markdown;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    /// Comment text
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub text: String,
    pub text_html: String,
    pub created_at: String,
}

impl From<CommentModel> for CommentResponse {
    fn from(c: CommentModel) -> Self {
        let text_html = render_markdown(&c.text);
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            text: c.text,
            text_html,
            created_at: c.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/comments",
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Chronological comment thread", body = Vec<CommentResponse>),
        (status = 404, description = "Post missing or not visible to this viewer", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    viewer: MaybeAuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now().naive_utc();

    // The thread is only served where the detail page itself would be.
    let post_service = PostService::new(db.clone());
    post_service
        .get_for_viewer(post_id, viewer.user_id(), now)
        .await?;

    let service = CommentService::new(db);
    let comments = service.list_by_post(post_id).await?;
    let items: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/comments",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db);
    let comment = service
        .create(post_id, auth_user.user_id, &payload.text)
        .await?;

    Ok(ApiResponse::ok(CommentResponse::from(comment)))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}/comments/{comment_id}",
    security(("jwt_token" = [])),
    params(
        ("post_id" = i32, Path, description = "Post ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "No such comment under this post", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((post_id, comment_id)): Path<(i32, i32)>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db);
    let comment = service
        .update(post_id, comment_id, auth_user.user_id, &payload.text)
        .await?;

    Ok(ApiResponse::ok(CommentResponse::from(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}/comments/{comment_id}",
    security(("jwt_token" = [])),
    params(
        ("post_id" = i32, Path, description = "Post ID"),
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "No such comment under this post", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((post_id, comment_id)): Path<(i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service
        .delete(post_id, comment_id, auth_user.user_id)
        .await?;

    Ok(ApiResponse::ok("Comment deleted"))
}

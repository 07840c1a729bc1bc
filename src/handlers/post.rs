use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::models::PostModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery, PAGE_SIZE};
use crate::services::category::CategoryService;
use crate::services::post::{PostInput, PostService};
use crate::utils::render_markdown;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

fn default_published() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    /// Post title (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Post body (Markdown supported)
    #[validate(length(min = 1))]
    pub text: String,
    /// Publication timestamp; a future date schedules the post
    pub pub_date: NaiveDateTime,
    /// Publication flag
    #[serde(default = "default_published")]
    pub is_published: bool,
    /// Category ID
    pub category_id: Option<i32>,
    /// Location ID
    pub location_id: Option<i32>,
    /// Image URL returned by the upload endpoint
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    /// Post ID
    pub id: i32,
    /// Author user ID
    pub author_id: i32,
    /// Category ID
    pub category_id: Option<i32>,
    /// Location ID
    pub location_id: Option<i32>,
    /// Post title
    pub title: String,
    /// Post body (Markdown)
    pub text: String,
    /// Rendered HTML body
    pub text_html: String,
    /// Publication timestamp
    pub pub_date: String,
    /// Publication flag
    pub is_published: bool,
    /// Image URL
    pub image_url: Option<String>,
    /// Number of comments
    pub comment_count: i64,
    /// Creation timestamp
    pub created_at: String,
}

impl PostResponse {
    pub fn with_comment_count(p: PostModel, comment_count: i64) -> Self {
        let text_html = render_markdown(&p.text);
        Self {
            id: p.id,
            author_id: p.author_id,
            category_id: p.category_id,
            location_id: p.location_id,
            title: p.title,
            text: p.text,
            text_html,
            pub_date: p.pub_date.to_string(),
            is_published: p.is_published,
            image_url: p.image_url,
            comment_count,
            created_at: p.created_at.to_string(),
        }
    }
}

impl From<PostModel> for PostResponse {
    fn from(p: PostModel) -> Self {
        Self::with_comment_count(p, 0)
    }
}

/// Map one page of posts to responses with their comment counts attached.
pub(crate) async fn page_to_responses(
    service: &PostService,
    posts: Vec<PostModel>,
) -> AppResult<Vec<PostResponse>> {
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let counts = service.comment_counts(&post_ids).await?;

    Ok(posts
        .into_iter()
        .map(|p| {
            let count = counts.get(&p.id).copied().unwrap_or(0);
            PostResponse::with_comment_count(p, count)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(("page" = Option<u64>, Query, description = "Page number (clamped to valid range)")),
    responses(
        (status = 200, description = "Paginated feed of visible posts", body = PaginatedResponse<PostResponse>),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now().naive_utc();

    let service = PostService::new(db);
    let page = service.feed(now, params.page.unwrap_or(1)).await?;
    let items = page_to_responses(&service, page.posts).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, page.total, page.page, PAGE_SIZE,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{slug}/posts",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ("page" = Option<u64>, Query, description = "Page number (clamped to valid range)"),
    ),
    responses(
        (status = 200, description = "Paginated feed for one category", body = PaginatedResponse<PostResponse>),
        (status = 404, description = "Category missing or unpublished", body = AppError),
    ),
    tag = "posts"
)]
pub async fn list_posts_by_category(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now().naive_utc();

    let category_service = CategoryService::new(db.clone());
    let category = category_service.get_published_by_slug(&slug).await?;

    let service = PostService::new(db);
    let page = service
        .feed_by_category(category.id, now, params.page.unwrap_or(1))
        .await?;
    let items = page_to_responses(&service, page.posts).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, page.total, page.page, PAGE_SIZE,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post missing or not visible to this viewer", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    viewer: MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now().naive_utc();

    let service = PostService::new(db);
    let post = service.get_for_viewer(id, viewer.user_id(), now).await?;
    let comment_count = service.comment_count(post.id).await? as i64;

    Ok(ApiResponse::ok(PostResponse::with_comment_count(
        post,
        comment_count,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/posts",
    security(("jwt_token" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = PostService::new(db);
    let post = service
        .create(
            auth_user.user_id,
            PostInput {
                title: payload.title,
                text: payload.text,
                pub_date: payload.pub_date,
                is_published: payload.is_published,
                category_id: payload.category_id,
                location_id: payload.location_id,
                image_url: payload.image_url,
            },
        )
        .await?;

    Ok(ApiResponse::ok(PostResponse::from(post)))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn update_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = PostService::new(db);
    let post = service
        .update(
            id,
            auth_user.user_id,
            PostInput {
                title: payload.title,
                text: payload.text,
                pub_date: payload.pub_date,
                is_published: payload.is_published,
                category_id: payload.category_id,
                location_id: payload.location_id,
                image_url: payload.image_url,
            },
        )
        .await?;
    let comment_count = service.comment_count(post.id).await? as i64;

    Ok(ApiResponse::ok(PostResponse::with_comment_count(
        post,
        comment_count,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    service.delete(id, auth_user.user_id).await?;

    Ok(ApiResponse::ok("Post deleted"))
}

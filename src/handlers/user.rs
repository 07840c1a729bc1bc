use crate::error::{AppError, AppResult};
use crate::handlers::post::{page_to_responses, PostResponse};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::models::UserModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery, PAGE_SIZE};
use crate::services::post::PostService;
use crate::services::user::{ProfileUpdate, UserService};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
    /// The profile owner's posts, newest publication date first.
    pub posts: PaginatedResponse<PostResponse>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    /// Username (3-150 characters)
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// First name
    #[validate(length(max = 150))]
    pub first_name: String,
    /// Last name
    #[validate(length(max = 150))]
    pub last_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileUserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserModel> for ProfileUserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<u64>, Query, description = "Post list page (clamped to valid range)"),
    ),
    responses(
        (status = 200, description = "Profile with paginated posts", body = ProfileResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    viewer: MaybeAuthUser,
    Path(username): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let now = chrono::Utc::now().naive_utc();

    let user_service = UserService::new(db.clone());
    let user = user_service.get_by_username(&username).await?;

    // Owners see their scheduled and unpublished posts; everyone else only
    // what the feed would show.
    let viewer_is_owner = viewer.user_id() == Some(user.id);

    let post_service = PostService::new(db);
    let page = post_service
        .list_by_author(user.id, viewer_is_owner, now, params.page.unwrap_or(1))
        .await?;
    let items = page_to_responses(&post_service, page.posts).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at: user.created_at.to_string(),
        posts: PaginatedResponse::new(items, page.total, page.page, PAGE_SIZE),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 409, description = "Username or email already exists", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = UserService::new(db);
    let user = service
        .update_profile(
            auth_user.user_id,
            ProfileUpdate {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
            },
        )
        .await?;

    Ok(ApiResponse::ok(ProfileUserResponse::from(user)))
}

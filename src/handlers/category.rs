use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::CategoryModel;
use crate::response::ApiResponse;
use crate::services::category::{CategoryInput, CategoryService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

fn default_published() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    /// Category title (1-256 characters)
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Category description
    pub description: String,
    /// URL slug: latin letters, digits, hyphen, underscore
    #[validate(length(min = 1, max = 64))]
    pub slug: String,
    /// Publication flag
    #[serde(default = "default_published")]
    pub is_published: bool,
}

/// Slugs are restricted to what can appear verbatim in a URL path segment.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_request(payload: &CategoryRequest) -> AppResult<()> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if !is_valid_slug(&payload.slug) {
        return Err(AppError::Validation(
            "Slug may only contain latin letters, digits, hyphen and underscore".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: String,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(c: CategoryModel) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            slug: c.slug,
            is_published: c.is_published,
            created_at: c.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Published categories", body = Vec<CategoryResponse>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let categories = service.list_published().await?;
    let response: Vec<CategoryResponse> =
        categories.into_iter().map(CategoryResponse::from).collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category details", body = CategoryResponse),
        (status = 404, description = "Category missing or unpublished", body = AppError),
    ),
    tag = "categories"
)]
pub async fn get_category(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let category = service.get_published_by_slug(&slug).await?;
    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    security(("jwt_token" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Slug already exists", body = AppError),
    ),
    tag = "categories"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&payload)?;
    require_admin(&db, &auth_user).await?;

    let service = CategoryService::new(db);
    let category = service
        .create(CategoryInput {
            title: payload.title,
            description: payload.description,
            slug: payload.slug,
            is_published: payload.is_published,
        })
        .await?;

    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{slug}",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Category slug")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
        (status = 409, description = "Slug already exists", body = AppError),
    ),
    tag = "categories"
)]
pub async fn update_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&payload)?;
    require_admin(&db, &auth_user).await?;

    let service = CategoryService::new(db);
    let category = service
        .update(
            &slug,
            CategoryInput {
                title: payload.title,
                description: payload.description,
                slug: payload.slug,
                is_published: payload.is_published,
            },
        )
        .await?;

    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    security(("jwt_token" = [])),
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category deleted; posts keep existing uncategorized", body = String),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;

    let service = CategoryService::new(db);
    service.delete(&slug).await?;

    Ok(ApiResponse::ok("Category deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_accepts_url_safe_chars() {
        assert!(is_valid_slug("travel-notes_2024"));
    }

    #[test]
    fn slug_rejects_spaces_and_unicode() {
        assert!(!is_valid_slug("travel notes"));
        assert!(!is_valid_slug("путешествия"));
        assert!(!is_valid_slug("a/b"));
    }

    #[test]
    fn slug_rejects_empty() {
        assert!(!is_valid_slug(""));
    }
}

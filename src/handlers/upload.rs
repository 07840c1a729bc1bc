use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::upload::{MediaConfig, UploadService};
use axum::{extract::Multipart, response::IntoResponse, Extension};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored image
    pub url: String,
}

/// Upload a post image.
/// POST /upload/image (multipart form: field "file")
#[utoipa::path(
    post,
    path = "/api/v1/upload/image",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Unsupported or corrupt file", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "uploads"
)]
pub async fn upload_image(
    Extension(config): Extension<MediaConfig>,
    _auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;

    let url = UploadService::save_image(&config, &data, &content_type).await?;

    Ok(ApiResponse::ok(UploadResponse { url }))
}

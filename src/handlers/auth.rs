use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use anyhow::anyhow;
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-150 characters)
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username
    pub username: String,
    /// User password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    /// User ID
    pub user_id: i32,
    /// Username
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    /// User ID
    pub id: i32,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// User role (user, admin)
    pub role: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username or email already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    let (user, access_token, refresh_token) = service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    let response = AuthResponse {
        token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        user_id: user.id,
        username: user.username,
    };

    let mut http_response =
        ApiResponse::with_message(response, "Registration successful.".to_string())
            .into_response();
    set_auth_cookies(&mut http_response, &access_token, &refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, access_token, refresh_token) =
        service.login(&payload.username, &payload.password).await?;

    let response = AuthResponse {
        token: access_token.clone(),
        refresh_token: refresh_token.clone(),
        user_id: user.id,
        username: user.username,
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &access_token, &refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let user = service.get_user_by_id(auth_user.user_id).await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password
    pub current_password: String,
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    security(("jwt_token" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = String),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .change_password(
            auth_user.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(ApiResponse::ok("Password changed successfully"))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    /// Refresh token (falls back to the HttpOnly cookie)
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// New JWT access token
    pub token: String,
    /// New JWT refresh token
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    let refresh_token = payload
        .and_then(|Json(body)| body.refresh_token)
        .or_else(|| {
            crate::utils::cookie::extract_cookie(
                &headers,
                crate::utils::cookie::REFRESH_TOKEN_COOKIE,
            )
        })
        .ok_or(AppError::Unauthorized)?;

    let claims = crate::utils::jwt::decode_jwt(&refresh_token)
        .map_err(|_| AppError::Unauthorized)?;

    if !crate::utils::jwt::is_refresh_token(&claims) {
        return Err(AppError::Unauthorized);
    }

    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    // Rotation invalidates the presented token and persists the new one.
    let service = AuthService::new(db);
    let (new_access_token, new_refresh_token) = service
        .rotate_refresh_token(user_id, &refresh_token)
        .await?;

    let response = TokenResponse {
        token: new_access_token.clone(),
        refresh_token: new_refresh_token.clone(),
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    set_auth_cookies(&mut http_response, &new_access_token, &new_refresh_token)?;
    Ok(http_response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Logout successful", body = String),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    // Best-effort revocation of the refresh token that is being discarded.
    if let Some(token) =
        crate::utils::cookie::extract_cookie(&headers, crate::utils::cookie::REFRESH_TOKEN_COOKIE)
    {
        let service = AuthService::new(db);
        let _ = service.revoke_refresh_token(&token).await;
    }

    let mut response = ApiResponse::ok("Logout successful").into_response();
    clear_auth_cookies(&mut response)?;
    Ok(response)
}

fn set_auth_cookies(
    response: &mut Response,
    access_token: &str,
    refresh_token: &str,
) -> AppResult<()> {
    let access_cookie = crate::utils::cookie::build_auth_cookie(
        crate::utils::cookie::ACCESS_TOKEN_COOKIE,
        access_token,
        crate::utils::jwt::access_token_expiry_seconds(),
    );
    let refresh_cookie = crate::utils::cookie::build_auth_cookie(
        crate::utils::cookie::REFRESH_TOKEN_COOKIE,
        refresh_token,
        crate::utils::jwt::refresh_token_expiry_seconds(),
    );

    append_set_cookie(response, &access_cookie)?;
    append_set_cookie(response, &refresh_cookie)?;
    Ok(())
}

fn clear_auth_cookies(response: &mut Response) -> AppResult<()> {
    append_set_cookie(
        response,
        &crate::utils::cookie::build_clear_cookie(crate::utils::cookie::ACCESS_TOKEN_COOKIE),
    )?;
    append_set_cookie(
        response,
        &crate::utils::cookie::build_clear_cookie(crate::utils::cookie::REFRESH_TOKEN_COOKIE),
    )?;
    Ok(())
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

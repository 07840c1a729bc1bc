use crate::{
    error::AppError,
    models::User,
    utils::{
        cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
        jwt::{decode_jwt, is_access_token},
    },
};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Request-scoped identity extracted from a verified JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
}

/// JWT authentication middleware for the protected route group.
///
/// Accepts the token from the Authorization header or the HttpOnly cookie,
/// requires an access token (not a refresh token), and checks the account
/// still exists before inserting `AuthUser` into request extensions.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, ACCESS_TOKEN_COOKIE))
        .ok_or(AppError::Unauthorized)?;

    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;

    if !is_access_token(&claims) {
        return Err(AppError::Unauthorized);
    }

    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    User::find_by_id(user_id)
        .one(&db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Verify the current user has the admin role.
pub async fn require_admin(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
) -> crate::error::AppResult<i32> {
    let user = User::find_by_id(auth_user.user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if user.role != "admin" {
        return Err(AppError::Forbidden);
    }
    Ok(user.id)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional identity for public routes whose output depends on the viewer
/// (post detail, profile post list). Routes outside the protected group do
/// not run `auth_middleware`, so this extractor decodes the token itself; a
/// missing or invalid token simply yields an anonymous viewer.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(Self(Some(user.clone())));
        }

        let identity = extract_bearer_token(&parts.headers)
            .or_else(|| extract_cookie(&parts.headers, ACCESS_TOKEN_COOKIE))
            .and_then(|token| decode_jwt(&token).ok())
            .filter(is_access_token)
            .and_then(|claims| claims.sub.parse().ok())
            .map(|user_id| AuthUser { user_id });

        Ok(Self(identity))
    }
}

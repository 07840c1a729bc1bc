mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::upload::MediaConfig;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::logout,
        crate::handlers::get_current_user,
        crate::handlers::change_password,
        // User routes
        crate::handlers::user::get_user_profile,
        crate::handlers::user::update_profile,
        // Category routes
        crate::handlers::category::list_categories,
        crate::handlers::category::get_category,
        crate::handlers::category::create_category,
        crate::handlers::category::update_category,
        crate::handlers::category::delete_category,
        // Location routes
        crate::handlers::location::list_locations,
        crate::handlers::location::create_location,
        crate::handlers::location::update_location,
        crate::handlers::location::delete_location,
        // Post routes
        crate::handlers::post::list_posts,
        crate::handlers::post::list_posts_by_category,
        crate::handlers::post::get_post,
        crate::handlers::post::create_post,
        crate::handlers::post::update_post,
        crate::handlers::post::delete_post,
        // Comment routes
        crate::handlers::comment::list_comments,
        crate::handlers::comment::create_comment,
        crate::handlers::comment::update_comment,
        crate::handlers::comment::delete_comment,
        // Upload routes
        crate::handlers::upload::upload_image,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            // Auth
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::RefreshTokenRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::TokenResponse,
            crate::handlers::auth::UserResponse,
            crate::handlers::auth::ChangePasswordRequest,
            // User
            crate::handlers::user::ProfileResponse,
            crate::handlers::user::ProfileUserResponse,
            crate::handlers::user::UpdateProfileRequest,
            // Category
            crate::handlers::category::CategoryRequest,
            crate::handlers::category::CategoryResponse,
            // Location
            crate::handlers::location::LocationRequest,
            crate::handlers::location::LocationResponse,
            // Post
            crate::handlers::post::CreatePostRequest,
            crate::handlers::post::PostResponse,
            // Comment
            crate::handlers::comment::CommentRequest,
            crate::handlers::comment::CommentResponse,
            // Upload
            crate::handlers::upload::UploadResponse,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "users", description = "Profile operations"),
        (name = "categories", description = "Category operations"),
        (name = "locations", description = "Location operations"),
        (name = "posts", description = "Post operations"),
        (name = "comments", description = "Comment operations"),
        (name = "uploads", description = "Image upload operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogr=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    // Initialize JWT config
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Blog API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let media_dir = env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string());
    let media_config = MediaConfig {
        media_dir: media_dir.clone(),
    };

    let app = create_app(&media_dir)
        .layer(Extension(db))
        .layer(Extension(media_config));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    // JWT config — validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    // Media directory — create if needed
    let media_dir = env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_string());
    std::fs::create_dir_all(&media_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create media directory '{}': {}", media_dir, e))?;

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(media_dir: &str) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Blog API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}

#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static TABLES_CLEANED: AtomicBool = AtomicBool::new(false);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = blogr::config::jwt::JwtConfig::from_env().unwrap();
        let _ = blogr::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        blogr::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables once per test binary. Tests inside one binary run
    // in parallel, so truncating on every spawn would pull data out from
    // under sibling tests; each binary instead starts from a clean slate
    // and tests assert on their own rows.
    if !TABLES_CLEANED.swap(true, Ordering::SeqCst) {
        cleanup_tables(&db).await;
    }

    let media_config = blogr::services::upload::MediaConfig {
        media_dir: "./test_media".to_string(),
    };

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(blogr::routes::create_routes())
        .layer(axum::middleware::from_fn(
            blogr::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(media_config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "refresh_tokens",
        "comments",
        "posts",
        "locations",
        "categories",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register test user");
    assert_eq!(resp.status(), 200, "registration should succeed");

    let body: serde_json::Value = resp.json().await.unwrap();
    let user_id = body["data"]["user_id"].as_i64().unwrap() as i32;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Promote a user to the admin role directly in the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = 'admin' WHERE id = $1",
        [user_id.into()],
    ))
    .await
    .expect("Failed to promote user to admin");
}

/// Create a published category through the admin API and return its slug.
pub async fn create_test_category(app: &TestApp, admin_token: &str) -> String {
    static CATEGORY_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = CATEGORY_COUNTER.fetch_add(1, Ordering::SeqCst);
    let slug = format!("category-{}", counter);

    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "title": format!("Category {}", counter),
            "description": "A test category",
            "slug": slug,
        }))
        .send()
        .await
        .expect("Failed to create test category");
    assert_eq!(resp.status(), 200, "category creation should succeed");

    slug
}

/// Timestamp `offset_hours` from now, in the format post endpoints accept.
pub fn ts(offset_hours: i64) -> String {
    (chrono::Utc::now().naive_utc() + chrono::Duration::hours(offset_hours))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Create a post and return its id.
pub async fn create_post(
    app: &TestApp,
    token: &str,
    title: &str,
    pub_date: &str,
    is_published: bool,
    category_id: Option<i64>,
) -> i64 {
    let resp = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "text": format!("Body of {}", title),
            "pub_date": pub_date,
            "is_published": is_published,
            "category_id": category_id,
        }))
        .send()
        .await
        .expect("Failed to create post");
    assert_eq!(resp.status(), 200, "post creation should succeed");

    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

/// Collect every post id in the global feed, walking all pages.
pub async fn feed_ids(app: &TestApp) -> Vec<i64> {
    let mut ids = Vec::new();
    let mut page = 1u64;
    loop {
        let resp = app
            .client
            .get(app.url(&format!("/posts?page={}", page)))
            .send()
            .await
            .expect("Failed to fetch feed");
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        let items = body["data"]["items"].as_array().unwrap();
        ids.extend(items.iter().map(|p| p["id"].as_i64().unwrap()));
        let total_pages = body["data"]["total_pages"].as_u64().unwrap();
        if page >= total_pages.max(1) {
            break;
        }
        page += 1;
    }
    ids
}

/// Number of comment rows currently stored for a post.
pub async fn comment_rows(db: &DatabaseConnection, post_id: i64) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM comments WHERE post_id = $1",
            [post_id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index(0).unwrap()
}

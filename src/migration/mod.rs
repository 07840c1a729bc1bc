use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_categories_table;
mod m20240101_000003_create_locations_table;
mod m20240101_000004_create_posts_table;
mod m20240101_000005_create_comments_table;
mod m20240101_000006_create_refresh_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_categories_table::Migration),
            Box::new(m20240101_000003_create_locations_table::Migration),
            Box::new(m20240101_000004_create_posts_table::Migration),
            Box::new(m20240101_000005_create_comments_table::Migration),
            Box::new(m20240101_000006_create_refresh_tokens::Migration),
        ]
    }
}

use crate::{
    error::{AppError, AppResult},
    models::{category, Category, CategoryModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct CategoryService {
    db: DatabaseConnection,
}

pub struct CategoryInput {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_published(&self) -> AppResult<Vec<CategoryModel>> {
        let categories = Category::find()
            .filter(category::Column::IsPublished.eq(true))
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    /// Slug lookup for readers: an unpublished category is indistinguishable
    /// from a missing one.
    pub async fn get_published_by_slug(&self, slug: &str) -> AppResult<CategoryModel> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .filter(category::Column::IsPublished.eq(true))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Slug lookup for administration, published or not.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<CategoryModel> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, input: CategoryInput) -> AppResult<CategoryModel> {
        if self.slug_taken(&input.slug, None).await? {
            return Err(AppError::Conflict(format!(
                "Category slug '{}' already exists",
                input.slug
            )));
        }

        let now = chrono::Utc::now().naive_utc();

        let new_category = category::ActiveModel {
            title: sea_orm::ActiveValue::Set(input.title),
            description: sea_orm::ActiveValue::Set(input.description),
            slug: sea_orm::ActiveValue::Set(input.slug),
            is_published: sea_orm::ActiveValue::Set(input.is_published),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let category = new_category.insert(&self.db).await?;
        Ok(category)
    }

    pub async fn update(&self, slug: &str, input: CategoryInput) -> AppResult<CategoryModel> {
        let existing = self.get_by_slug(slug).await?;

        if input.slug != existing.slug && self.slug_taken(&input.slug, Some(existing.id)).await? {
            return Err(AppError::Conflict(format!(
                "Category slug '{}' already exists",
                input.slug
            )));
        }

        let mut active: category::ActiveModel = existing.into();
        active.title = sea_orm::ActiveValue::Set(input.title);
        active.description = sea_orm::ActiveValue::Set(input.description);
        active.slug = sea_orm::ActiveValue::Set(input.slug);
        active.is_published = sea_orm::ActiveValue::Set(input.is_published);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Deleting a category leaves its posts in place with the reference
    /// cleared (ON DELETE SET NULL).
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let existing = self.get_by_slug(slug).await?;
        Category::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let mut query = Category::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

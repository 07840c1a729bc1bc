use crate::{
    error::{AppError, AppResult},
    models::{location, Location, LocationModel},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

pub struct LocationService {
    db: DatabaseConnection,
}

impl LocationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_published(&self) -> AppResult<Vec<LocationModel>> {
        let locations = Location::find()
            .filter(location::Column::IsPublished.eq(true))
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await?;
        Ok(locations)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<LocationModel> {
        Location::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, name: &str, is_published: bool) -> AppResult<LocationModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_location = location::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            is_published: sea_orm::ActiveValue::Set(is_published),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let location = new_location.insert(&self.db).await?;
        Ok(location)
    }

    pub async fn update(&self, id: i32, name: &str, is_published: bool) -> AppResult<LocationModel> {
        let existing = self.get_by_id(id).await?;

        let mut active: location::ActiveModel = existing.into();
        active.name = sea_orm::ActiveValue::Set(name.to_string());
        active.is_published = sea_orm::ActiveValue::Set(is_published);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Posts keep existing with their location reference nulled.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        Location::delete_by_id(existing.id).exec(&self.db).await?;
        Ok(())
    }
}

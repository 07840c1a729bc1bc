use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

pub struct UserService {
    db: DatabaseConnection,
}

/// Self-service profile fields, mirroring what the edit form exposes.
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> AppResult<UserModel> {
        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        // Username and email stay unique across other accounts.
        let taken = User::find()
            .filter(user::Column::Id.ne(user_id))
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Username.eq(update.username.as_str()))
                    .add(user::Column::Email.eq(update.email.as_str())),
            )
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = existing.into();
        active.username = sea_orm::ActiveValue::Set(update.username);
        active.email = sea_orm::ActiveValue::Set(update.email);
        active.first_name = sea_orm::ActiveValue::Set(update.first_name);
        active.last_name = sea_orm::ActiveValue::Set(update.last_name);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}

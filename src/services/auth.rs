use crate::{
    error::{AppError, AppResult},
    models::{refresh_token, user, RefreshToken, User, UserModel},
    utils::{encode_access_token, encode_refresh_token, hash_password, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, TransactionTrait,
};

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new account.
    /// Returns (user_model, access_token, refresh_token).
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<(UserModel, String, String)> {
        if self.user_exists(username, email).await? {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            first_name: sea_orm::ActiveValue::Set(String::new()),
            last_name: sea_orm::ActiveValue::Set(String::new()),
            role: sea_orm::ActiveValue::Set("user".to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let (access_token, refresh_token) = self.issue_tokens_for_user(user.id).await?;

        Ok((user, access_token, refresh_token))
    }

    /// Login with username and password.
    /// Returns (user_model, access_token, refresh_token).
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<(UserModel, String, String)> {
        let user = self
            .find_by_username(username)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        let is_valid = verify_password(password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Unauthorized);
        }

        let (access_token, refresh_token) = self.issue_tokens_for_user(user.id).await?;

        Ok((user, access_token, refresh_token))
    }

    /// Exchange a valid refresh token for a fresh pair, invalidating the
    /// presented one. The stored hash must exist and be unexpired.
    pub async fn rotate_refresh_token(
        &self,
        user_id: i32,
        current_refresh_token: &str,
    ) -> AppResult<(String, String)> {
        let token_hash = crate::utils::jwt::hash_refresh_token(current_refresh_token);
        let now = chrono::Utc::now().naive_utc();

        let existing = RefreshToken::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::Token.eq(token_hash))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if existing.expires_at <= now {
            let _ = RefreshToken::delete_by_id(existing.id).exec(&self.db).await;
            return Err(AppError::Unauthorized);
        }

        let txn = self.db.begin().await?;
        RefreshToken::delete_by_id(existing.id).exec(&txn).await?;
        let (access_token, refresh_token) = self.issue_tokens_for_user_txn(&txn, user_id).await?;
        txn.commit().await?;
        Ok((access_token, refresh_token))
    }

    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> AppResult<()> {
        let token_hash = crate::utils::jwt::hash_refresh_token(refresh_token);
        RefreshToken::delete_many()
            .filter(refresh_token::Column::Token.eq(token_hash))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn revoke_all_user_refresh_tokens(&self, user_id: i32) -> AppResult<()> {
        RefreshToken::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        let user = User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(user)
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<UserModel> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(user)
    }

    /// Change password for an authenticated user. All refresh tokens are
    /// revoked so stolen ones die with the old password.
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;
        let is_valid = verify_password(current_password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }
        let new_hash = hash_password(new_password)?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        self.revoke_all_user_refresh_tokens(user_id).await?;
        Ok(())
    }

    async fn issue_tokens_for_user(&self, user_id: i32) -> AppResult<(String, String)> {
        self.issue_tokens_for_user_txn(&self.db, user_id).await
    }

    async fn issue_tokens_for_user_txn<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
    ) -> AppResult<(String, String)> {
        let user_id_str = user_id.to_string();
        let access_token = encode_access_token(&user_id_str)?;
        let refresh_token = encode_refresh_token(&user_id_str)?;
        self.persist_refresh_token(conn, user_id, &refresh_token)
            .await?;
        Ok((access_token, refresh_token))
    }

    async fn persist_refresh_token<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        refresh_token: &str,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now
            + chrono::Duration::seconds(crate::utils::jwt::refresh_token_expiry_seconds() as i64);

        let model = refresh_token::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            token: sea_orm::ActiveValue::Set(crate::utils::jwt::hash_refresh_token(refresh_token)),
            expires_at: sea_orm::ActiveValue::Set(expires_at),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        model.insert(conn).await?;
        Ok(())
    }
}

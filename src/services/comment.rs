use crate::{
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel, Post},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Chronological thread for one post, oldest first.
    pub async fn list_by_post(&self, post_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        post_id: i32,
        author_id: i32,
        text: &str,
    ) -> AppResult<CommentModel> {
        // The stated post must exist before anything is written.
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();

        let new_comment = comment::ActiveModel {
            post_id: sea_orm::ActiveValue::Set(post_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            text: sea_orm::ActiveValue::Set(text.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        Ok(comment)
    }

    /// Look up a comment addressed as (post, comment). A comment id that
    /// exists under a different post is treated as missing.
    pub async fn get_for_post(&self, post_id: i32, comment_id: i32) -> AppResult<CommentModel> {
        let comment = Comment::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if comment.post_id != post_id {
            return Err(AppError::NotFound);
        }

        Ok(comment)
    }

    /// Edits replace the text only; created_at never changes.
    pub async fn update(
        &self,
        post_id: i32,
        comment_id: i32,
        user_id: i32,
        text: &str,
    ) -> AppResult<CommentModel> {
        let existing = self.get_for_post(post_id, comment_id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        let mut active: comment::ActiveModel = existing.into();
        active.text = sea_orm::ActiveValue::Set(text.to_string());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, post_id: i32, comment_id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_for_post(post_id, comment_id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        Comment::delete_by_id(comment_id).exec(&self.db).await?;
        Ok(())
    }
}

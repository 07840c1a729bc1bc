use crate::{
    error::{AppError, AppResult},
    models::{comment, post, Category, Comment, Location, Post, PostModel},
    response::{clamp_page, PAGE_SIZE},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use std::collections::HashMap;

/// Fields accepted for post creation and full-replace updates.
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub is_published: bool,
    pub category_id: Option<i32>,
    pub location_id: Option<i32>,
    pub image_url: Option<String>,
}

/// One page of posts together with the pagination facts needed to render it.
pub struct PostPage {
    pub posts: Vec<PostModel>,
    pub total: u64,
    pub page: u64,
}

/// A post is publicly visible iff its publication flag is set, its pub_date
/// has elapsed, and its category (if any) is published.
fn is_visible(post: &PostModel, category_published: bool, now: NaiveDateTime) -> bool {
    post.is_published && post.pub_date <= now && category_published
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// SQL form of the visible-post predicate. Callers must left-join the
    /// category relation for the category clause to resolve.
    fn visible_condition(now: NaiveDateTime) -> Condition {
        Condition::all()
            .add(post::Column::IsPublished.eq(true))
            .add(post::Column::PubDate.lte(now))
            .add(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(crate::models::category::Column::IsPublished.eq(true)),
            )
    }

    /// Paginate a post query at the fixed page size, clamping the requested
    /// page into the valid range.
    async fn fetch_page(
        &self,
        query: Select<Post>,
        requested_page: u64,
    ) -> AppResult<PostPage> {
        let paginator = query.paginate(&self.db, PAGE_SIZE);
        let totals = paginator.num_items_and_pages().await?;
        let page = clamp_page(requested_page, totals.number_of_pages);
        let posts = paginator.fetch_page(page - 1).await?;
        Ok(PostPage {
            posts,
            total: totals.number_of_items,
            page,
        })
    }

    /// Global feed: publicly visible posts, newest publication date first.
    pub async fn feed(&self, now: NaiveDateTime, requested_page: u64) -> AppResult<PostPage> {
        let query = Post::find()
            .join(JoinType::LeftJoin, post::Relation::Category.def())
            .filter(Self::visible_condition(now))
            .order_by_desc(post::Column::PubDate);
        self.fetch_page(query, requested_page).await
    }

    /// Category feed. The caller resolves the category and checks it is
    /// published, so only the per-post clauses apply here.
    pub async fn feed_by_category(
        &self,
        category_id: i32,
        now: NaiveDateTime,
        requested_page: u64,
    ) -> AppResult<PostPage> {
        let query = Post::find()
            .filter(post::Column::CategoryId.eq(category_id))
            .filter(post::Column::IsPublished.eq(true))
            .filter(post::Column::PubDate.lte(now))
            .order_by_desc(post::Column::PubDate);
        self.fetch_page(query, requested_page).await
    }

    /// Posts for a profile page. Owners see everything they wrote,
    /// scheduled and unpublished included; other viewers only what is
    /// publicly visible.
    pub async fn list_by_author(
        &self,
        author_id: i32,
        viewer_is_owner: bool,
        now: NaiveDateTime,
        requested_page: u64,
    ) -> AppResult<PostPage> {
        let mut query = Post::find().filter(post::Column::AuthorId.eq(author_id));
        if !viewer_is_owner {
            query = query
                .join(JoinType::LeftJoin, post::Relation::Category.def())
                .filter(Self::visible_condition(now));
        }
        let query = query.order_by_desc(post::Column::PubDate);
        self.fetch_page(query, requested_page).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Detail lookup: the author always sees their own post; everyone else
    /// gets 404 unless the post is publicly visible.
    pub async fn get_for_viewer(
        &self,
        id: i32,
        viewer: Option<i32>,
        now: NaiveDateTime,
    ) -> AppResult<PostModel> {
        let post = self.get_by_id(id).await?;

        if viewer == Some(post.author_id) {
            return Ok(post);
        }

        let category_published = match post.category_id {
            Some(cid) => Category::find_by_id(cid)
                .one(&self.db)
                .await?
                .map(|c| c.is_published)
                .unwrap_or(false),
            None => true,
        };

        if !is_visible(&post, category_published, now) {
            return Err(AppError::NotFound);
        }

        Ok(post)
    }

    pub async fn create(&self, author_id: i32, input: PostInput) -> AppResult<PostModel> {
        self.check_references(input.category_id, input.location_id)
            .await?;

        let now = chrono::Utc::now().naive_utc();

        let new_post = post::ActiveModel {
            author_id: sea_orm::ActiveValue::Set(author_id),
            category_id: sea_orm::ActiveValue::Set(input.category_id),
            location_id: sea_orm::ActiveValue::Set(input.location_id),
            title: sea_orm::ActiveValue::Set(input.title),
            text: sea_orm::ActiveValue::Set(input.text),
            pub_date: sea_orm::ActiveValue::Set(input.pub_date),
            is_published: sea_orm::ActiveValue::Set(input.is_published),
            image_url: sea_orm::ActiveValue::Set(input.image_url),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let post = new_post.insert(&self.db).await?;
        Ok(post)
    }

    pub async fn update(&self, id: i32, user_id: i32, input: PostInput) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        self.check_references(input.category_id, input.location_id)
            .await?;

        let now = chrono::Utc::now().naive_utc();

        let mut active: post::ActiveModel = existing.into();
        active.title = sea_orm::ActiveValue::Set(input.title);
        active.text = sea_orm::ActiveValue::Set(input.text);
        active.pub_date = sea_orm::ActiveValue::Set(input.pub_date);
        active.is_published = sea_orm::ActiveValue::Set(input.is_published);
        active.category_id = sea_orm::ActiveValue::Set(input.category_id);
        active.location_id = sea_orm::ActiveValue::Set(input.location_id);
        active.image_url = sea_orm::ActiveValue::Set(input.image_url);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Deleting a post cascades to its comments at the schema level.
    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        Post::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn comment_count(&self, post_id: i32) -> AppResult<u64> {
        let count = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Batch comment counts for one page of posts.
    pub async fn comment_counts(&self, post_ids: &[i32]) -> AppResult<HashMap<i32, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Comment::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "count")
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(comment::Column::PostId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Referenced category and location rows must exist; the ORM surfaces a
    /// clean validation error instead of a foreign-key violation.
    async fn check_references(
        &self,
        category_id: Option<i32>,
        location_id: Option<i32>,
    ) -> AppResult<()> {
        if let Some(cid) = category_id {
            Category::find_by_id(cid)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Unknown category id {cid}")))?;
        }
        if let Some(lid) = location_id {
            Location::find_by_id(lid)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Validation(format!("Unknown location id {lid}")))?;
        }
        Ok(())
    }
}

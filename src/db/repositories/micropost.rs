use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::NewMicropost;
use crate::entities::{microposts, prelude::*};

use super::SaveError;

#[derive(Debug, Clone)]
pub struct Micropost {
    pub id: i32,
    pub content: String,
    pub user_id: i32,
    pub created_at: String,
}

impl From<microposts::Model> for Micropost {
    fn from(model: microposts::Model) -> Self {
        Self {
            id: model.id,
            content: model.content,
            user_id: model.user_id,
            created_at: model.created_at,
        }
    }
}

pub struct MicropostRepository {
    conn: DatabaseConnection,
}

impl MicropostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a post for `user_id`. The owner always comes from the
    /// authenticated request context, so `user_id` is correct by
    /// construction.
    pub async fn create(
        &self,
        user_id: i32,
        new_post: &NewMicropost,
    ) -> Result<Micropost, SaveError> {
        new_post.validate().map_err(SaveError::Invalid)?;

        let active = microposts::ActiveModel {
            content: Set(new_post.content.clone()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await.map_err(|e| {
            SaveError::Database(anyhow::Error::new(e).context("Failed to insert micropost"))
        })?;

        Ok(Micropost::from(model))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Micropost>> {
        let post = Microposts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query micropost by ID")?;

        Ok(post.map(Micropost::from))
    }

    /// Fetch by id, then verify ownership: a post that exists but belongs
    /// to someone else is indistinguishable from a missing one.
    pub async fn find_owned(&self, id: i32, user_id: i32) -> Result<Option<Micropost>> {
        let post = Microposts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query owned micropost")?;

        Ok(post
            .filter(|p| p.user_id == user_id)
            .map(Micropost::from))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Microposts::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete micropost")?;

        Ok(res.rows_affected > 0)
    }

    /// All of one user's posts, newest first. Id breaks ties between posts
    /// created within the same timestamp.
    pub async fn for_user(&self, user_id: i32) -> Result<Vec<Micropost>> {
        let rows = Microposts::find()
            .filter(microposts::Column::UserId.eq(user_id))
            .order_by_desc(microposts::Column::CreatedAt)
            .order_by_desc(microposts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query microposts for user")?;

        Ok(rows.into_iter().map(Micropost::from).collect())
    }
}

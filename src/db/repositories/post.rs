use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set};
use tracing::{info, warn};
use uuid::Uuid;

use super::user::User;
use crate::db::StorageError;
use crate::entities::{post, user};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDate,
}

impl From<post::Model> for Post {
    fn from(model: post::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            content: model.content,
            created_at: model.created_at,
        }
    }
}

/// A post together with the user that owns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: User,
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Every post joined with its author, newest first.
    pub async fn list_with_authors(&self) -> Result<Vec<PostWithAuthor>, StorageError> {
        let rows = post::Entity::find()
            .find_also_related(user::Entity)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Title)
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(post, author)| match author {
                Some(author) => Some(PostWithAuthor {
                    post: Post::from(post),
                    author: User::from(author),
                }),
                None => {
                    warn!(post_id = %post.id, user_id = %post.user_id, "Skipping post without author");
                    None
                }
            })
            .collect())
    }

    /// Insert a post under a freshly generated id.
    ///
    /// The owning user is not looked up first; an unknown `user_id` is
    /// rejected by the foreign key as [`StorageError::Constraint`].
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        created_at: NaiveDate,
    ) -> Result<Post, StorageError> {
        let active = post::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            created_at: Set(created_at),
        };

        let model = active.insert(&self.conn).await?;
        info!(post_id = %model.id, user_id = %model.user_id, "Created post");
        metrics::counter!("posts_created_total").increment(1);

        Ok(Post::from(model))
    }

    pub async fn count(&self) -> Result<u64, StorageError> {
        Ok(post::Entity::find().count(&self.conn).await?)
    }
}

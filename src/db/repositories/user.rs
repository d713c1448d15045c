use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::info;
use uuid::Uuid;

use crate::db::StorageError;
use crate::entities::user;

/// Account record as handed to the web layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username. `None` means no such user, not a failure.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        let user = user::Entity::find_by_id(id.to_string())
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    /// Insert a user under a freshly generated id.
    ///
    /// A taken username or email surfaces as [`StorageError::Constraint`];
    /// nothing is checked up front.
    pub async fn create(&self, username: &str, email: &str) -> Result<User, StorageError> {
        let active = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
        };

        let model = active.insert(&self.conn).await?;
        info!(user_id = %model.id, username = %model.username, "Created user");
        metrics::counter!("users_created_total").increment(1);

        Ok(User::from(model))
    }

    pub async fn count(&self) -> Result<u64, StorageError> {
        Ok(user::Entity::find().count(&self.conn).await?)
    }
}

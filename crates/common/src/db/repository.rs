//! Repository pattern for database operations
//!
//! SeaORM-backed implementation of `ThesisStore`.

use crate::db::models::*;
use crate::db::store::{ThesisRecord, ThesisStore};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

/// Repository for data access operations
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }
}

#[async_trait]
impl ThesisStore for Repository {
    async fn find_thesis(&self, id: i64) -> Result<Option<ThesisRecord>> {
        let found = ThesisEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(self.read_conn())
            .await?;

        match found {
            None => Ok(None),
            Some((thesis, Some(author))) => Ok(Some(ThesisRecord { thesis, author })),
            Some((thesis, None)) => Err(AppError::Internal {
                message: format!(
                    "Thesis {} references missing author {}",
                    thesis.id, thesis.author_id
                ),
            }),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    async fn update_thesis(
        &self,
        id: i64,
        changes: ThesisChanges,
        audit: NewHistoryEntry,
    ) -> Result<Thesis> {
        let txn = self.write_conn().begin().await?;

        let thesis = ThesisEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::ThesisNotFound { id })?;

        let now = chrono::Utc::now();
        let updated = changes
            .into_active_model(thesis, now.into())
            .update(&txn)
            .await?;

        let entry = HistoryActiveModel {
            id: NotSet,
            user_id: Set(audit.user_id),
            action: Set(audit.action),
            description: Set(audit.description),
            created_at: Set(now.into()),
        };
        entry.insert(&txn).await?;

        txn.commit().await?;

        Ok(updated)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

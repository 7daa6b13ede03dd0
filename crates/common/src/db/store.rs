//! Persistence seam used by the admin handlers
//!
//! Handlers depend on `ThesisStore` rather than on a database connection so the
//! merge-patch and response shaping can run against an in-memory store.

use async_trait::async_trait;

use crate::db::models::{NewHistoryEntry, Thesis, ThesisChanges, User};
use crate::errors::Result;

/// A thesis together with its (single) author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThesisRecord {
    pub thesis: Thesis,
    pub author: User,
}

#[async_trait]
pub trait ThesisStore: Send + Sync {
    /// Look up a thesis and its author by id
    async fn find_thesis(&self, id: i64) -> Result<Option<ThesisRecord>>;

    /// Look up a user by unique username
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up a user by id
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Apply `changes` to the thesis and append `audit` in one transaction.
    ///
    /// Fails with `ThesisNotFound` if the row disappeared since it was read.
    async fn update_thesis(
        &self,
        id: i64,
        changes: ThesisChanges,
        audit: NewHistoryEntry,
    ) -> Result<Thesis>;

    /// Check connectivity
    async fn ping(&self) -> Result<()>;
}

//! Persistence boundary.
//!
//! The engine only ever reads a whole document, changes it in memory and
//! writes it back. Projects carry a version so that write can be a
//! compare-and-swap.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Message, Project, User};

#[cfg(test)]
pub mod memory;
pub mod mongo;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored version differs from the one the caller read.
    #[error("version conflict")]
    Conflict,
    /// A unique key is already taken.
    #[error("duplicate {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> StoreResult<()>;
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Users whose id is in `ids`, in no particular order.
    async fn find_many(&self, ids: &[String]) -> StoreResult<Vec<User>>;
    /// Case-insensitive substring match on email.
    async fn search_email(&self, query: &str) -> StoreResult<Vec<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn update(&self, user: &User) -> StoreResult<bool>;
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert(&self, project: &Project) -> StoreResult<()>;
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Project>>;
    /// Projects owned by `user_id` or listing it in `team`.
    async fn find_for_user(&self, user_id: &str) -> StoreResult<Vec<Project>>;
    /// Overwrites the stored document if its version still equals
    /// `project.version`, then bumps `project.version`.
    async fn save(&self, project: &mut Project) -> StoreResult<()>;
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(&self, message: &Message) -> StoreResult<()>;
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Message>>;
    async fn find_by_project(&self, project_id: &str) -> StoreResult<Vec<Message>>;
    /// Adds `user_id` to the message's read receipts in one atomic update
    /// and returns the message as stored afterwards. `None` if it is gone.
    async fn add_reader(&self, id: &str, user_id: &str) -> StoreResult<Option<Message>>;
    /// Returns how many messages were removed.
    async fn delete_by_project(&self, project_id: &str) -> StoreResult<u64>;
}

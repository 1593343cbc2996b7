use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::poll_models::{Poll, VoteUpdate};
use crate::utils::error::AppResult;

/// Typed access to the poll collection. Handlers only ever see this trait,
/// so the backing store is picked once at startup.
#[async_trait]
pub trait PollRepository: Send + Sync {
    async fn insert(&self, poll: Poll) -> AppResult<Poll>;

    async fn find_all(&self) -> AppResult<Vec<Poll>>;

    async fn find_by_id(&self, id: ObjectId) -> AppResult<Option<Poll>>;

    /// Applies the vote in one atomic step. `Ok(false)` means the guards no
    /// longer held when the write reached the store.
    async fn record_vote(&self, update: &VoteUpdate) -> AppResult<bool>;

    /// Marks the poll inactive and returns the updated document.
    async fn close(&self, id: ObjectId) -> AppResult<Option<Poll>>;
}

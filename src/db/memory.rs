use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::db::repository::PollRepository;
use crate::models::poll_models::{Poll, VoteUpdate};
use crate::utils::error::AppResult;

/// Process-local poll store. Writes are serialized by the lock, which makes
/// every vote a single check-and-apply step.
#[derive(Default)]
pub struct InMemoryPollRepository {
    polls: RwLock<Vec<Poll>>,
}

impl InMemoryPollRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollRepository for InMemoryPollRepository {
    async fn insert(&self, poll: Poll) -> AppResult<Poll> {
        self.polls.write().await.push(poll.clone());
        Ok(poll)
    }

    async fn find_all(&self) -> AppResult<Vec<Poll>> {
        Ok(self.polls.read().await.clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> AppResult<Option<Poll>> {
        let polls = self.polls.read().await;
        Ok(polls.iter().find(|poll| poll.id == id).cloned())
    }

    async fn record_vote(&self, update: &VoteUpdate) -> AppResult<bool> {
        let mut polls = self.polls.write().await;
        Ok(polls
            .iter_mut()
            .find(|poll| poll.id == update.poll_id)
            .is_some_and(|poll| poll.apply_vote(update)))
    }

    async fn close(&self, id: ObjectId) -> AppResult<Option<Poll>> {
        let mut polls = self.polls.write().await;
        Ok(polls.iter_mut().find(|poll| poll.id == id).map(|poll| {
            poll.is_active = false;
            poll.clone()
        }))
    }
}

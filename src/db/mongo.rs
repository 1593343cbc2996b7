use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson, Document},
    options::ReturnDocument,
    Collection, Database,
};

use crate::db::repository::PollRepository;
use crate::models::poll_models::{Poll, VoteUpdate};
use crate::utils::error::AppResult;

pub const POLLS_COLLECTION: &str = "polls";

/// Matches the poll only while every vote guard still holds.
fn vote_filter(update: &VoteUpdate) -> Document {
    let mut filter = doc! {
        "_id": update.poll_id,
        "isActive": true,
        "endDate": { "$gte": update.now },
        "options._id": update.option_id,
    };
    if let Some(name) = &update.unique_voter {
        // matches only if no option of the poll holds this voter yet
        filter.insert("options.voters.voterName", doc! { "$ne": name.as_str() });
    }
    filter
}

fn vote_modifications(update: &VoteUpdate) -> AppResult<Document> {
    let mut modifications = doc! {
        "$inc": { "options.$[target].votes": 1_i64 },
    };
    if let Some(vote) = &update.vote {
        modifications.insert(
            "$push",
            doc! { "options.$[target].voters": to_bson(vote)? },
        );
    }
    Ok(modifications)
}

fn vote_array_filters(update: &VoteUpdate) -> Vec<Document> {
    vec![doc! { "target._id": update.option_id }]
}

pub struct MongoPollRepository {
    polls: Collection<Poll>,
}

impl MongoPollRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            polls: db.collection::<Poll>(POLLS_COLLECTION),
        }
    }
}

#[async_trait]
impl PollRepository for MongoPollRepository {
    async fn insert(&self, poll: Poll) -> AppResult<Poll> {
        self.polls.insert_one(&poll).await?;
        Ok(poll)
    }

    async fn find_all(&self) -> AppResult<Vec<Poll>> {
        let cursor = self.polls.find(doc! {}).await?;
        let polls: Vec<Poll> = cursor.try_collect().await?;
        Ok(polls)
    }

    async fn find_by_id(&self, id: ObjectId) -> AppResult<Option<Poll>> {
        Ok(self.polls.find_one(doc! { "_id": id }).await?)
    }

    async fn record_vote(&self, update: &VoteUpdate) -> AppResult<bool> {
        let result = self
            .polls
            .update_one(vote_filter(update), vote_modifications(update)?)
            .array_filters(vote_array_filters(update))
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn close(&self, id: ObjectId) -> AppResult<Option<Poll>> {
        let poll = self
            .polls
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "isActive": false } })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(poll)
    }
}

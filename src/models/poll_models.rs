use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A poll document as persisted in the `polls` collection. Options and their
/// votes are embedded.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub question: String,
    pub options: Vec<PollOption>,
    pub created_at: DateTime,
    pub end_date: DateTime,
    pub is_active: bool,
    pub require_voter_name: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PollOption {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub text: String,
    pub votes: i64,
    pub voters: Vec<Vote>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub voter_name: String,
    pub timestamp: DateTime,
}

/// Reasons a ballot is refused, in the order they are checked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
    #[error("Voter name is required for this poll")]
    VoterNameRequired,

    #[error("Invalid option id")]
    InvalidOption,

    #[error("Poll is no longer active")]
    Inactive,

    #[error("You have already voted on this poll")]
    AlreadyVoted,
}

/// A guarded vote: applied only if the poll is still open, still has the
/// option and, when names are required, has not seen this voter yet.
#[derive(Debug, Clone)]
pub struct VoteUpdate {
    pub poll_id: ObjectId,
    pub option_id: ObjectId,
    pub vote: Option<Vote>,
    pub unique_voter: Option<String>,
    pub now: DateTime,
}

impl Poll {
    pub fn new(
        question: String,
        options: Vec<String>,
        end_date: DateTime,
        require_voter_name: bool,
    ) -> Self {
        Poll {
            id: ObjectId::new(),
            question,
            options: options
                .into_iter()
                .map(|text| PollOption {
                    id: ObjectId::new(),
                    text,
                    votes: 0,
                    voters: Vec::new(),
                })
                .collect(),
            created_at: DateTime::now(),
            end_date,
            is_active: true,
            require_voter_name,
        }
    }

    pub fn accepts_votes_at(&self, now: DateTime) -> bool {
        self.is_active && self.end_date >= now
    }

    pub fn has_voter(&self, voter_name: &str) -> bool {
        self.options
            .iter()
            .any(|option| option.voters.iter().any(|vote| vote.voter_name == voter_name))
    }

    /// Runs the ballot checks against the current document and returns the
    /// id of the option being voted for.
    pub fn check_vote(
        &self,
        option_id: &str,
        voter_name: Option<&str>,
        now: DateTime,
    ) -> Result<ObjectId, VoteRejection> {
        let voter_name = voter_name.filter(|name| !name.is_empty());

        if self.require_voter_name && voter_name.is_none() {
            return Err(VoteRejection::VoterNameRequired);
        }

        let option = self
            .options
            .iter()
            .find(|option| option.id.to_hex() == option_id)
            .ok_or(VoteRejection::InvalidOption)?;

        if !self.accepts_votes_at(now) {
            return Err(VoteRejection::Inactive);
        }

        if self.require_voter_name {
            if let Some(name) = voter_name {
                if self.has_voter(name) {
                    return Err(VoteRejection::AlreadyVoted);
                }
            }
        }

        Ok(option.id)
    }

    /// Applies `update` if its guards still hold. Returns whether it was applied.
    pub fn apply_vote(&mut self, update: &VoteUpdate) -> bool {
        if self.id != update.poll_id || !self.accepts_votes_at(update.now) {
            return false;
        }
        if let Some(name) = &update.unique_voter {
            if self.has_voter(name) {
                return false;
            }
        }

        let Some(option) = self.options.iter_mut().find(|o| o.id == update.option_id) else {
            return false;
        };

        option.votes += 1;
        if let Some(vote) = &update.vote {
            option.voters.push(vote.clone());
        }
        true
    }
}

impl VoteUpdate {
    pub fn new(
        poll: &Poll,
        option_id: ObjectId,
        voter_name: Option<&str>,
        now: DateTime,
    ) -> Self {
        let voter_name = voter_name.filter(|name| !name.is_empty());
        VoteUpdate {
            poll_id: poll.id,
            option_id,
            vote: voter_name.map(|name| Vote {
                id: ObjectId::new(),
                voter_name: name.to_string(),
                timestamp: now,
            }),
            unique_voter: voter_name
                .filter(|_| poll.require_voter_name)
                .map(str::to_string),
            now,
        }
    }
}

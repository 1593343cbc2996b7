pub mod cast_vote;
pub mod close_poll;
pub mod create_poll;
pub mod get_poll;
pub mod models;
pub mod polls;

use mongodb::bson::oid::ObjectId;

use crate::utils::error::{AppError, AppResult};

/// A malformed id cannot name a stored poll, so it is reported as missing.
pub(crate) fn parse_poll_id(poll_id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(poll_id).map_err(|_| poll_not_found())
}

pub(crate) fn poll_not_found() -> AppError {
    AppError::NotFound("Poll not found".to_string())
}

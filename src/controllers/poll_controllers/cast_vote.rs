use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use mongodb::bson::DateTime;
use tracing::{debug, info};

use crate::controllers::poll_controllers::{models::CastVoteRequest, parse_poll_id, poll_not_found};
use crate::models::poll_models::{VoteRejection, VoteUpdate};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// An empty body is an anonymous ballot.
fn parse_vote_body(body: &Bytes) -> AppResult<CastVoteRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CastVoteRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

pub async fn cast_vote(
    Path((poll_id, option_id)): Path<(String, String)>,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<StatusCode> {
    let poll_obj_id = parse_poll_id(&poll_id)?;

    let poll = state
        .polls
        .find_by_id(poll_obj_id)
        .await?
        .ok_or_else(poll_not_found)?;

    let payload = parse_vote_body(&body)?;
    let voter_name = payload.voter_name.as_deref().filter(|name| !name.is_empty());

    let log_rejection = |rejection: VoteRejection| {
        debug!("Rejected vote on poll {poll_obj_id}: {rejection}");
        rejection
    };

    let now = DateTime::now();
    let target = poll
        .check_vote(&option_id, voter_name, now)
        .map_err(log_rejection)?;

    let update = VoteUpdate::new(&poll, target, voter_name, now);

    if !state.polls.record_vote(&update).await? {
        // the poll changed between the read and the guarded write
        let current = state
            .polls
            .find_by_id(poll_obj_id)
            .await?
            .ok_or_else(poll_not_found)?;
        current
            .check_vote(&option_id, voter_name, DateTime::now())
            .map_err(log_rejection)?;

        return Err(AppError::BadRequest(
            "Vote could not be recorded, please retry".to_string(),
        ));
    }

    info!("Recorded vote on poll {poll_obj_id} for option {target}");

    Ok(StatusCode::OK)
}

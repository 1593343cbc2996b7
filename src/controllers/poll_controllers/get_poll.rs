use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::controllers::poll_controllers::{models::PollResponse, parse_poll_id, poll_not_found};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<PollResponse>> {
    let obj_id = parse_poll_id(&poll_id)?;

    let poll = state
        .polls
        .find_by_id(obj_id)
        .await?
        .ok_or_else(poll_not_found)?;

    debug!("Fetched poll {}", poll.id);

    Ok(Json(PollResponse::from(poll)))
}

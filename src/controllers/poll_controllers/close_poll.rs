use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::controllers::poll_controllers::{models::PollResponse, parse_poll_id, poll_not_found};
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn close_poll(
    Path(poll_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<PollResponse>> {
    let obj_id = parse_poll_id(&poll_id)?;

    let updated_poll = state
        .polls
        .close(obj_id)
        .await?
        .ok_or_else(poll_not_found)?;

    info!("Closed poll {}", updated_poll.id);

    Ok(Json(PollResponse::from(updated_poll)))
}

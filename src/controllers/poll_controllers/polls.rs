use axum::{extract::State, Json};

use crate::controllers::poll_controllers::models::PollResponse;
use crate::state::AppState;
use crate::utils::error::AppResult;

pub async fn get_all_polls(State(state): State<AppState>) -> AppResult<Json<Vec<PollResponse>>> {
    let polls = state.polls.find_all().await?;

    let poll_responses: Vec<PollResponse> = polls.into_iter().map(PollResponse::from).collect();

    Ok(Json(poll_responses))
}

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::controllers::poll_controllers::models::{
    to_bson_date, CreatePollRequest, JsonBody, PollResponse,
};
use crate::models::poll_models::Poll;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

pub async fn create_poll(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreatePollRequest>,
) -> AppResult<(StatusCode, Json<PollResponse>)> {
    if payload.question.is_empty() {
        return Err(AppError::ValidationError("Poll question is required".to_string()));
    }

    if let Some(index) = payload.options.iter().position(|text| text.is_empty()) {
        return Err(AppError::ValidationError(format!(
            "Option {} must have text",
            index + 1
        )));
    }

    let new_poll = Poll::new(
        payload.question,
        payload.options,
        to_bson_date(payload.end_date),
        payload.require_voter_name,
    );

    let saved_poll = state.polls.insert(new_poll).await?;

    info!(
        "Created poll {} with {} options",
        saved_poll.id,
        saved_poll.options.len()
    );

    Ok((StatusCode::CREATED, Json(PollResponse::from(saved_poll))))
}

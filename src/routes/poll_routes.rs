use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::controllers::poll_controllers::{cast_vote, close_poll, create_poll, get_poll, polls};
use crate::state::AppState;

pub fn poll_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(polls::get_all_polls).post(create_poll::create_poll))
        .route("/:pollId", get(get_poll::get_poll))
        .route("/:pollId/vote/:optionId", post(cast_vote::cast_vote))
        .route("/:pollId/close", patch(close_poll::close_poll))
        .with_state(state)
}

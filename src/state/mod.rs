use std::sync::Arc;

use crate::db::PollRepository;

#[derive(Clone)]
pub struct AppState {
    pub polls: Arc<dyn PollRepository>,
}

impl AppState {
    pub fn new(polls: Arc<dyn PollRepository>) -> Self {
        Self { polls }
    }
}

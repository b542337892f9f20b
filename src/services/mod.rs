use crate::config::Config;
use crate::storage::Storage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self { config, storage }
    }
}

pub mod achievement_rules;
pub mod answer_service;
pub mod problem_service;
pub mod session_service;
pub mod tutoring_service;

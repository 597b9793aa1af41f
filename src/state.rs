use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::repositories::{AttemptRepository, MemoryStore, PgStore, QuizRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub config: Config,
}

impl AppState {
    pub fn with_postgres(store: PgStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            quizzes: store.clone(),
            attempts: store,
            config,
        }
    }

    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            quizzes: store.clone(),
            attempts: store,
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// src/state.rs
use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::services::PollService;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub polls: PollService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            polls: PollService::new(store.clone(), config.slug_length),
            auth: AuthService::new(store.clone(), config.bcrypt_cost),
            store,
        }
    }
}

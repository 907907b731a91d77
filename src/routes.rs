// src/routes.rs
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use http::{Method, header::CONTENT_TYPE};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/polls", get(handlers::list_polls).post(handlers::create_poll))
        .route("/polls/{slug}", get(handlers::get_poll))
        .route("/polls/{slug}/vote", post(handlers::cast_vote))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .layer(cors_layer(config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match &config.cors_allow_origin {
        Some(origin) => cors.allow_origin(origin.clone()),
        None => cors.allow_origin(Any),
    }
}

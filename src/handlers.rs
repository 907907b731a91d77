// src/handlers.rs
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::{
    CreatePollRequest, CreatePollResponse, LoginRequest, RegisterRequest, UserResponse,
    VoteRequest, VoteResponse, VoterQuery,
};
use crate::poll::PollResults;
use crate::state::AppState;

/// List every poll, newest first
pub async fn list_polls(
    State(state): State<AppState>,
    query: Result<Query<VoterQuery>, QueryRejection>,
) -> Result<Json<Vec<PollResults>>, AppError> {
    let Query(query) = query?;
    let polls = state.polls.list(query.voter_id.as_deref()).await?;
    Ok(Json(polls))
}

/// Create a poll with its options
pub async fn create_poll(
    State(state): State<AppState>,
    payload: Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePollResponse>), AppError> {
    let Json(request) = payload?;
    let slug = state.polls.create_poll(request).await?;
    Ok((StatusCode::CREATED, Json(CreatePollResponse { slug })))
}

/// Get a poll with vote counts and percentages
pub async fn get_poll(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<VoterQuery>, QueryRejection>,
) -> Result<Json<PollResults>, AppError> {
    let Query(query) = query?;
    let results = state.polls.results(&slug, query.voter_id.as_deref()).await?;
    Ok(Json(results))
}

/// Vote for an option of a poll
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteResponse>), AppError> {
    let Json(request) = payload?;
    state.polls.cast_vote(&slug, request).await?;
    Ok((StatusCode::CREATED, Json(VoteResponse { ok: true })))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(request) = payload?;
    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(request) = payload?;
    let user = state.auth.login(request).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}

//! Backend of a small polling service.
//!
//! Polls are created with two to eight options and addressed by a random
//! slug. Anyone can vote once per poll under a caller-supplied voter id;
//! results are computed from the stored votes on every read.
//!
//! # Routes
//!
//! | Method | Path | |
//! |---|---|---|
//! | `GET` | `/polls` | all polls with results, `?voterId=` adds the caller's vote |
//! | `POST` | `/polls` | create a poll |
//! | `GET` | `/polls/{slug}` | results of one poll |
//! | `POST` | `/polls/{slug}/vote` | cast a vote |
//! | `POST` | `/auth/register` | create an account |
//! | `POST` | `/auth/login` | check credentials |
//! | `GET` | `/health` | store ping |
//!
//! # Double voting
//!
//! The one-vote-per-voter rule is a unique constraint on `(poll_id, voter_id)`
//! checked inside the vote transaction. Two concurrent votes by the same voter
//! race on the index, not on an application-level lookup, so exactly one
//! commits and the other is reported as a conflict.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod services;
pub mod slug;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use routes::create_routes;
pub use state::AppState;

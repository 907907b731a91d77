// src/store/mod.rs
//! Persistence for polls, votes and accounts.
//!
//! Both backends enforce the same constraints at their transactional
//! boundary: one vote per (poll, voter), unique slugs, unique emails and
//! usernames. Callers never check for a duplicate before inserting.
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewPoll, NewUser, OptionTally, Poll, User, Vote};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Poll not found")]
    PollNotFound,
    #[error("Option does not belong to poll")]
    InvalidOption,
    #[error("Voter already voted in poll")]
    AlreadyVoted,
    #[error("Slug already in use")]
    SlugTaken,
    #[error("Email or username already in use")]
    UserExists,
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts the poll and its options in one transaction.
    /// Fails with `SlugTaken` if `slug` already exists.
    async fn create_poll(&self, slug: &str, poll: &NewPoll) -> StoreResult<Poll>;

    async fn find_poll(&self, slug: &str) -> StoreResult<Option<Poll>>;

    /// All polls, newest first.
    async fn list_polls(&self) -> StoreResult<Vec<Poll>>;

    /// Vote count of every option of the poll, ordered by position.
    async fn option_tallies(&self, poll_id: i64) -> StoreResult<Vec<OptionTally>>;

    /// Option the voter chose in this poll, if any.
    async fn voter_choice(&self, poll_id: i64, voter_id: &str) -> StoreResult<Option<i64>>;

    /// Records a vote atomically. Checks, in order: the poll exists
    /// (`PollNotFound`), the option belongs to it (`InvalidOption`) and the
    /// voter has no vote in it yet (`AlreadyVoted`).
    async fn cast_vote(&self, slug: &str, voter_id: &str, option_id: i64) -> StoreResult<Vote>;

    async fn create_user(&self, user: &NewUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn health_check(&self) -> StoreResult<()>;
}

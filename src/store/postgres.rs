// src/store/postgres.rs
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{NewPoll, NewUser, OptionTally, Poll, User, Vote};

const POLLS_SLUG_KEY: &str = "polls_slug_key";
const VOTES_POLL_VOTER_KEY: &str = "votes_poll_voter_key";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

/// Maps a unique violation to `conflict`, optionally only for one named constraint.
fn on_unique_violation(err: sqlx::Error, constraint: Option<&str>, conflict: StoreError) -> StoreError {
    let is_conflict = matches!(
        &err,
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                && constraint.is_none_or(|name| db.constraint() == Some(name))
    );

    if is_conflict { conflict } else { StoreError::Database(err) }
}

#[async_trait]
impl Store for PgStore {
    async fn create_poll(&self, slug: &str, poll: &NewPoll) -> StoreResult<Poll> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Poll>(
            "INSERT INTO polls (slug, title, creator_id) VALUES ($1, $2, $3) \
             RETURNING id, slug, title, creator_id, created_at",
        )
        .bind(slug)
        .bind(&poll.title)
        .bind(&poll.creator_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, Some(POLLS_SLUG_KEY), StoreError::SlugTaken))?;

        let mut options =
            QueryBuilder::<Postgres>::new("INSERT INTO poll_options (poll_id, label, position) ");
        options.push_values(poll.options.iter().enumerate(), |mut row, (index, label)| {
            row.push_bind(created.id)
                .push_bind(label.as_str())
                .push_bind(index as i32 + 1);
        });
        options.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_poll(&self, slug: &str) -> StoreResult<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(
            "SELECT id, slug, title, creator_id, created_at FROM polls WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(poll)
    }

    async fn list_polls(&self) -> StoreResult<Vec<Poll>> {
        let polls = sqlx::query_as::<_, Poll>(
            "SELECT id, slug, title, creator_id, created_at FROM polls \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(polls)
    }

    async fn option_tallies(&self, poll_id: i64) -> StoreResult<Vec<OptionTally>> {
        let tallies = sqlx::query_as::<_, OptionTally>(
            r#"
            SELECT po.id AS option_id, po.label, po.position, COUNT(v.id) AS votes
            FROM poll_options po
            LEFT JOIN votes v ON v.option_id = po.id
            WHERE po.poll_id = $1
            GROUP BY po.id, po.label, po.position
            ORDER BY po.position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tallies)
    }

    async fn voter_choice(&self, poll_id: i64, voter_id: &str) -> StoreResult<Option<i64>> {
        let option_id = sqlx::query_scalar::<_, i64>(
            "SELECT option_id FROM votes WHERE poll_id = $1 AND voter_id = $2",
        )
        .bind(poll_id)
        .bind(voter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option_id)
    }

    async fn cast_vote(&self, slug: &str, voter_id: &str, option_id: i64) -> StoreResult<Vote> {
        // Dropping `tx` on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let poll_id = sqlx::query_scalar::<_, i64>("SELECT id FROM polls WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::PollNotFound)?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM poll_options WHERE id = $1 AND poll_id = $2")
            .bind(option_id)
            .bind(poll_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::InvalidOption)?;

        // A concurrent insert for the same voter blocks on the unique index
        // until the other transaction ends, then fails here.
        let vote = sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (poll_id, option_id, voter_id) VALUES ($1, $2, $3) \
             RETURNING id, poll_id, option_id, voter_id, created_at",
        )
        .bind(poll_id)
        .bind(option_id)
        .bind(voter_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, Some(VOTES_POLL_VOTER_KEY), StoreError::AlreadyVoted))?;

        tx.commit()
            .await
            .map_err(|e| on_unique_violation(e, Some(VOTES_POLL_VOTER_KEY), StoreError::AlreadyVoted))?;
        Ok(vote)
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, username, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, username, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, None, StoreError::UserExists))?;
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, username, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// src/store/memory.rs
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{NewPoll, NewUser, OptionTally, Poll, PollOption, User, Vote};

#[derive(Default)]
struct Tables {
    polls: Vec<Poll>,
    slugs: HashMap<String, usize>,
    options: Vec<PollOption>,
    votes: Vec<Vote>,
    /// Unique index over (poll_id, voter_id).
    voters: HashSet<(i64, String)>,
    users: Vec<User>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Every operation runs under one lock, which makes
/// each of them a serializable transaction.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_poll(&self, slug: &str, poll: &NewPoll) -> StoreResult<Poll> {
        let mut tables = self.tables()?;
        if tables.slugs.contains_key(slug) {
            return Err(StoreError::SlugTaken);
        }

        let created = Poll {
            id: tables.next_id(),
            slug: slug.to_string(),
            title: poll.title.clone(),
            creator_id: poll.creator_id.clone(),
            created_at: Utc::now(),
        };
        for (index, label) in poll.options.iter().enumerate() {
            let option = PollOption {
                id: tables.next_id(),
                poll_id: created.id,
                label: label.clone(),
                position: index as i32 + 1,
            };
            tables.options.push(option);
        }

        let row = tables.polls.len();
        tables.slugs.insert(created.slug.clone(), row);
        tables.polls.push(created.clone());
        Ok(created)
    }

    async fn find_poll(&self, slug: &str) -> StoreResult<Option<Poll>> {
        let tables = self.tables()?;
        Ok(tables.slugs.get(slug).map(|&row| tables.polls[row].clone()))
    }

    async fn list_polls(&self) -> StoreResult<Vec<Poll>> {
        let tables = self.tables()?;
        let mut polls = tables.polls.clone();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(polls)
    }

    async fn option_tallies(&self, poll_id: i64) -> StoreResult<Vec<OptionTally>> {
        let tables = self.tables()?;

        let mut tallies: Vec<OptionTally> = tables
            .options
            .iter()
            .filter(|option| option.poll_id == poll_id)
            .map(|option| OptionTally {
                option_id: option.id,
                label: option.label.clone(),
                position: option.position,
                votes: tables
                    .votes
                    .iter()
                    .filter(|vote| vote.option_id == option.id)
                    .count() as i64,
            })
            .collect();
        tallies.sort_by_key(|tally| tally.position);
        Ok(tallies)
    }

    async fn voter_choice(&self, poll_id: i64, voter_id: &str) -> StoreResult<Option<i64>> {
        let tables = self.tables()?;
        Ok(tables
            .votes
            .iter()
            .find(|vote| vote.poll_id == poll_id && vote.voter_id == voter_id)
            .map(|vote| vote.option_id))
    }

    async fn cast_vote(&self, slug: &str, voter_id: &str, option_id: i64) -> StoreResult<Vote> {
        let mut tables = self.tables()?;

        let poll_id = match tables.slugs.get(slug) {
            Some(&row) => tables.polls[row].id,
            None => return Err(StoreError::PollNotFound),
        };
        if !tables
            .options
            .iter()
            .any(|option| option.id == option_id && option.poll_id == poll_id)
        {
            return Err(StoreError::InvalidOption);
        }
        if !tables.voters.insert((poll_id, voter_id.to_string())) {
            return Err(StoreError::AlreadyVoted);
        }

        let vote = Vote {
            id: tables.next_id(),
            poll_id,
            option_id,
            voter_id: voter_id.to_string(),
            created_at: Utc::now(),
        };
        tables.votes.push(vote.clone());
        Ok(vote)
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        let mut tables = self.tables()?;
        if tables
            .users
            .iter()
            .any(|existing| existing.email == user.email || existing.username == user.username)
        {
            return Err(StoreError::UserExists);
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|user| user.email == email).cloned())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.tables().map(|_| ())
    }
}

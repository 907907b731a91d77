// src/services.rs
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{CreatePollRequest, NewPoll, Poll, VoteRequest};
use crate::poll::{self, MAX_IDENTITY_LEN, PollResults};
use crate::slug::make_slug;
use crate::store::{Store, StoreError};

/// Poll creation, vote casting and result reads.
///
/// Holds no state of its own: every guarantee about votes comes from the store.
#[derive(Clone)]
pub struct PollService {
    store: Arc<dyn Store>,
    slug_length: usize,
}

impl PollService {
    pub fn new(store: Arc<dyn Store>, slug_length: usize) -> Self {
        Self { store, slug_length }
    }

    /// Returns the slug of the new poll. A slug collision is reported as a
    /// conflict and left to the caller to retry.
    pub async fn create_poll(&self, request: CreatePollRequest) -> Result<String, AppError> {
        let new_poll = NewPoll::from_request(request)?;
        let slug = make_slug(self.slug_length);

        let poll = self.store.create_poll(&slug, &new_poll).await.map_err(|e| {
            if matches!(e, StoreError::SlugTaken) {
                warn!(slug = %slug, "Slug collision on poll creation");
            }
            e
        })?;

        info!(
            slug = %poll.slug,
            creator = %poll.creator_id,
            options = new_poll.options.len(),
            "Poll created"
        );
        Ok(poll.slug)
    }

    pub async fn results(&self, slug: &str, voter_id: Option<&str>) -> Result<PollResults, AppError> {
        let poll = self
            .store
            .find_poll(slug)
            .await?
            .ok_or(StoreError::PollNotFound)?;

        self.results_for(&poll, voter_id).await
    }

    /// Every poll with its results, newest first.
    pub async fn list(&self, voter_id: Option<&str>) -> Result<Vec<PollResults>, AppError> {
        let polls = self.store.list_polls().await?;

        let mut results = Vec::with_capacity(polls.len());
        for poll in &polls {
            results.push(self.results_for(poll, voter_id).await?);
        }
        Ok(results)
    }

    pub async fn cast_vote(&self, slug: &str, request: VoteRequest) -> Result<(), AppError> {
        let voter_id = request.voter_id.trim();
        let option_id = match request.option_id {
            Some(option_id) if !voter_id.is_empty() => option_id,
            _ => {
                return Err(AppError::Validation(
                    "voterId and optionId required".to_string(),
                ));
            }
        };
        if voter_id.chars().count() > MAX_IDENTITY_LEN {
            return Err(AppError::Validation(format!(
                "voterId must be at most {MAX_IDENTITY_LEN} characters"
            )));
        }

        match self.store.cast_vote(slug, voter_id, option_id).await {
            Ok(vote) => {
                info!(slug, option_id = vote.option_id, "Vote recorded");
                Ok(())
            }
            Err(e @ (StoreError::PollNotFound | StoreError::InvalidOption | StoreError::AlreadyVoted)) => {
                debug!(slug, option_id, "Vote rejected: {e}");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn results_for(&self, poll: &Poll, voter_id: Option<&str>) -> Result<PollResults, AppError> {
        let tallies = self.store.option_tallies(poll.id).await?;
        let results = poll::summarize(poll, tallies);

        match voter_id.map(str::trim).filter(|voter| !voter.is_empty()) {
            Some(voter) => {
                let choice = self.store.voter_choice(poll.id, voter).await?;
                Ok(results.with_voter(choice))
            }
            None => Ok(results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

    fn service() -> PollService {
        PollService::new(Arc::new(MemoryStore::new()), 10)
    }

    fn create_request(options: &[&str]) -> CreatePollRequest {
        CreatePollRequest {
            title: "Where to eat".to_string(),
            creator_id: "alice".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn vote(voter: &str, option_id: i64) -> VoteRequest {
        VoteRequest {
            voter_id: voter.to_string(),
            option_id: Some(option_id),
        }
    }

    #[tokio::test]
    async fn test_create_returns_unique_slugs() {
        let service = service();
        let mut slugs = HashSet::new();
        for count in 2..=8 {
            let labels: Vec<String> = (0..count).map(|i| format!("place {i}")).collect();
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            let slug = service.create_poll(create_request(&labels)).await.unwrap();
            assert_eq!(slug.len(), 10);
            slugs.insert(slug);
        }
        assert_eq!(slugs.len(), 7);
    }

    #[tokio::test]
    async fn test_votes_aggregate_into_results() {
        let service = service();
        let slug = service.create_poll(create_request(&["A", "B", "C"])).await.unwrap();
        let ids: Vec<i64> = service
            .results(&slug, None)
            .await
            .unwrap()
            .options
            .iter()
            .map(|o| o.option_id)
            .collect();

        for voter in ["v1", "v2", "v3"] {
            service.cast_vote(&slug, vote(voter, ids[0])).await.unwrap();
        }
        service.cast_vote(&slug, vote("v4", ids[1])).await.unwrap();

        let results = service.results(&slug, Some("v4")).await.unwrap();
        assert_eq!(results.total_votes, 4);
        let percents: Vec<f64> = results.options.iter().map(|o| o.percent).collect();
        assert_eq!(percents, vec![75.0, 25.0, 0.0]);

        let voter = results.voter.unwrap();
        assert!(voter.has_voted);
        assert_eq!(voter.user_vote, Some(ids[1]));
    }

    #[tokio::test]
    async fn test_vote_requires_voter_and_option() {
        let service = service();
        let slug = service.create_poll(create_request(&["A", "B"])).await.unwrap();

        let missing_voter = VoteRequest {
            voter_id: "  ".to_string(),
            option_id: Some(1),
        };
        assert!(matches!(
            service.cast_vote(&slug, missing_voter).await,
            Err(AppError::Validation(_))
        ));

        let missing_option = VoteRequest {
            voter_id: "bob".to_string(),
            option_id: None,
        };
        assert!(matches!(
            service.cast_vote(&slug, missing_option).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_voter_id_length_limit() {
        let service = service();
        let slug = service.create_poll(create_request(&["A", "B"])).await.unwrap();
        let option_id = service.results(&slug, None).await.unwrap().options[0].option_id;

        let longest = "v".repeat(MAX_IDENTITY_LEN);
        service.cast_vote(&slug, vote(&longest, option_id)).await.unwrap();

        assert!(matches!(
            service.cast_vote(&slug, vote(&format!("{longest}v"), option_id)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_poll_is_not_found() {
        let service = service();
        assert!(matches!(
            service.results("nope", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.cast_vote("nope", vote("bob", 1)).await,
            Err(AppError::NotFound(_))
        ));
    }
}

// src/poll.rs
//! Poll input validation and result aggregation.
//!
//! Aggregates are never stored. Every read derives vote counts and
//! percentages from the tallies the store returns.
use serde::Serialize;

use crate::error::AppError;
use crate::models::{CreatePollRequest, NewPoll, OptionTally, Poll};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 8;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 255;
pub const MAX_IDENTITY_LEN: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub slug: String,
    pub title: String,
    pub creator_id: String,
}

impl From<&Poll> for PollSummary {
    fn from(poll: &Poll) -> Self {
        Self {
            slug: poll.slug.clone(),
            title: poll.title.clone(),
            creator_id: poll.creator_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResult {
    pub option_id: i64,
    pub label: String,
    pub position: i32,
    pub votes: i64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterStatus {
    pub has_voted: bool,
    pub user_vote: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub poll: PollSummary,
    pub total_votes: i64,
    pub options: Vec<OptionResult>,
    #[serde(flatten)]
    pub voter: Option<VoterStatus>,
}

impl PollResults {
    pub fn with_voter(mut self, user_vote: Option<i64>) -> Self {
        self.voter = Some(VoterStatus {
            has_voted: user_vote.is_some(),
            user_vote,
        });
        self
    }
}

/// Share of `votes` in `total` as a percentage rounded to two decimals.
///
/// Each option is rounded on its own, so the shares of a poll can add up to
/// slightly more or less than 100.
pub fn percent(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (votes as f64 * 10000.0 / total as f64).round() / 100.0
}

/// Builds the results view of `poll` from its per-option tallies.
pub fn summarize(poll: &Poll, mut tallies: Vec<OptionTally>) -> PollResults {
    tallies.sort_by_key(|tally| tally.position);

    let total_votes: i64 = tallies.iter().map(|tally| tally.votes).sum();
    let options = tallies
        .into_iter()
        .map(|tally| OptionResult {
            percent: percent(tally.votes, total_votes),
            option_id: tally.option_id,
            label: tally.label,
            position: tally.position,
            votes: tally.votes,
        })
        .collect();

    PollResults {
        poll: PollSummary::from(poll),
        total_votes,
        options,
        voter: None,
    }
}

impl NewPoll {
    /// Validates a create request. Title, creator and labels are trimmed.
    pub fn from_request(request: CreatePollRequest) -> Result<Self, AppError> {
        let title = request.title.trim().to_string();
        let creator_id = request.creator_id.trim().to_string();

        if title.is_empty() || creator_id.is_empty() {
            return Err(AppError::Validation(
                "title and creatorId required".to_string(),
            ));
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&request.options.len()) {
            return Err(AppError::Validation(format!(
                "options must be an array of {MIN_OPTIONS}..{MAX_OPTIONS} strings"
            )));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if creator_id.chars().count() > MAX_IDENTITY_LEN {
            return Err(AppError::Validation(format!(
                "creatorId must be at most {MAX_IDENTITY_LEN} characters"
            )));
        }

        let mut options = Vec::with_capacity(request.options.len());
        for label in request.options {
            let label = label.trim();
            if label.is_empty() {
                return Err(AppError::Validation(
                    "option labels must not be empty".to_string(),
                ));
            }
            if label.chars().count() > MAX_LABEL_LEN {
                return Err(AppError::Validation(format!(
                    "option labels must be at most {MAX_LABEL_LEN} characters"
                )));
            }
            options.push(label.to_string());
        }

        Ok(Self {
            title,
            creator_id,
            options,
        })
    }
}

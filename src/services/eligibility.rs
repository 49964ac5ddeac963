//! Decides whether a caller may cast a particular vote.
//!
//! Pure: it never touches the store. The store repeats the duplicate-option and
//! single-vote rules under its uniqueness constraints, so a decision here is
//! advisory and a racing insert can still come back as a conflict.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{OptionId, Poll, PollOption, UserId, Vote};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DenyReason {
    #[error("Voting requires a signed-in user")]
    Unauthenticated,

    #[error("Poll is closed")]
    PollClosed,

    #[error("Invalid option for this poll")]
    InvalidOption,

    #[error("You have already voted for this option")]
    DuplicateOption,

    #[error("This poll accepts a single vote per user")]
    SingleVoteExceeded,
}

impl DenyReason {
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "Unauthenticated",
            DenyReason::PollClosed => "PollClosed",
            DenyReason::InvalidOption => "InvalidOption",
            DenyReason::DuplicateOption => "DuplicateOption",
            DenyReason::SingleVoteExceeded => "SingleVoteExceeded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
}

impl Eligibility {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// First failing check wins: identity, closed, option membership, duplicate
/// option, then the single-vote rule.
pub fn can_vote(
    poll: &Poll,
    options: &[PollOption],
    option_id: &OptionId,
    user_id: Option<&UserId>,
    prior_votes: &[Vote],
    now: DateTime<Utc>,
) -> Eligibility {
    let Some(user_id) = user_id else {
        return Eligibility::denied(DenyReason::Unauthenticated);
    };

    if !poll.is_open(now) {
        return Eligibility::denied(DenyReason::PollClosed);
    }

    let belongs = options
        .iter()
        .any(|option| &option.id == option_id && option.poll_id == poll.id);
    if !belongs {
        return Eligibility::denied(DenyReason::InvalidOption);
    }

    let mine: Vec<&Vote> = prior_votes
        .iter()
        .filter(|vote| vote.poll_id == poll.id && &vote.user_id == user_id)
        .collect();

    if mine.iter().any(|vote| &vote.option_id == option_id) {
        return Eligibility::denied(DenyReason::DuplicateOption);
    }

    if !poll.allow_multiple_votes && !mine.is_empty() {
        return Eligibility::denied(DenyReason::SingleVoteExceeded);
    }

    Eligibility::allowed()
}

/// Whether the caller could cast any vote at all, without naming an option.
pub fn voting_status(poll: &Poll, user_votes: &[Vote], now: DateTime<Utc>) -> Eligibility {
    if !poll.is_open(now) {
        return Eligibility::denied(DenyReason::PollClosed);
    }
    let has_voted = user_votes.iter().any(|vote| vote.poll_id == poll.id);
    if !poll.allow_multiple_votes && has_voted {
        return Eligibility::denied(DenyReason::SingleVoteExceeded);
    }
    Eligibility::allowed()
}

//! The vote path: eligibility, insert, re-aggregate.

use chrono::{DateTime, Utc};
use tracing::info;

use super::{
    eligibility::{can_vote, voting_status, DenyReason},
    results::{aggregate, AggregatedResult},
};
use crate::{
    dtos::responses::MyVotesDTO,
    error::AppError,
    models::{OptionId, Poll, PollId, UserId, Vote},
    repositories::PollStore,
};

pub(crate) async fn load_poll(store: &dyn PollStore, poll_id: &PollId) -> Result<Poll, AppError> {
    store
        .find_poll(poll_id)
        .await?
        .ok_or(AppError::PollNotFound)
}

/// Current tallies for a poll.
pub async fn poll_results(
    store: &dyn PollStore,
    poll_id: &PollId,
) -> Result<AggregatedResult, AppError> {
    let poll = load_poll(store, poll_id).await?;
    let options = store.options_for(poll_id).await?;
    let votes = store.votes_for(poll_id).await?;
    Ok(aggregate(&poll, &options, &votes)?)
}

/// Unknown polls are 404 before identity is looked at; everything after that
/// is the checker's call. A lost insert race surfaces with the same reason
/// the checker would have given.
pub async fn cast_vote(
    store: &dyn PollStore,
    poll_id: &PollId,
    option_id: &OptionId,
    caller: Option<&UserId>,
    now: DateTime<Utc>,
) -> Result<AggregatedResult, AppError> {
    let poll = load_poll(store, poll_id).await?;
    let options = store.options_for(poll_id).await?;
    let prior = match caller {
        Some(user_id) => store.user_votes_for(poll_id, user_id).await?,
        None => Vec::new(),
    };

    can_vote(&poll, &options, option_id, caller, &prior, now).into_result()?;

    let user_id = caller.ok_or(DenyReason::Unauthenticated)?;
    let option = options
        .iter()
        .find(|option| &option.id == option_id)
        .ok_or(DenyReason::InvalidOption)?;

    let vote = Vote::cast(&poll, option, user_id.clone(), now)?;
    store.insert_vote(&vote, !poll.allow_multiple_votes).await?;
    info!("User {} voted for {} on poll {}", user_id, option_id, poll_id);

    let votes = store.votes_for(poll_id).await?;
    Ok(aggregate(&poll, &options, &votes)?)
}

/// Removes the caller's vote for one option. Closed polls keep their votes.
pub async fn retract_vote(
    store: &dyn PollStore,
    poll_id: &PollId,
    option_id: &OptionId,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<AggregatedResult, AppError> {
    let poll = load_poll(store, poll_id).await?;
    if !poll.is_open(now) {
        return Err(DenyReason::PollClosed.into());
    }

    if !store.delete_vote(poll_id, option_id, user_id).await? {
        return Err(AppError::VoteNotFound);
    }
    info!("User {} retracted their vote for {} on poll {}", user_id, option_id, poll_id);

    let options = store.options_for(poll_id).await?;
    let votes = store.votes_for(poll_id).await?;
    Ok(aggregate(&poll, &options, &votes)?)
}

pub async fn my_votes(
    store: &dyn PollStore,
    poll_id: &PollId,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<MyVotesDTO, AppError> {
    let poll = load_poll(store, poll_id).await?;
    let votes = store.user_votes_for(poll_id, user_id).await?;
    let eligibility = voting_status(&poll, &votes, now);
    Ok(MyVotesDTO { votes, eligibility })
}

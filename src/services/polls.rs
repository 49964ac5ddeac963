use chrono::{DateTime, Utc};
use tracing::info;

use super::{
    results::{aggregate, AggregateError},
    votes::load_poll,
};
use crate::{
    dtos::responses::{PollDetailsDTO, PollSummaryDTO},
    error::AppError,
    models::{OptionId, Poll, PollChanges, PollDraft, PollId, PollOption, UserId, MIN_OPTIONS},
    repositories::{PollFilter, PollStore},
};

async fn details(store: &dyn PollStore, poll: Poll) -> Result<PollDetailsDTO, AppError> {
    let options = store.options_for(&poll.id).await?;
    let votes = store.votes_for(&poll.id).await?;
    let results = aggregate(&poll, &options, &votes)?;
    Ok(PollDetailsDTO {
        poll,
        options,
        results,
    })
}

async fn owned_poll(
    store: &dyn PollStore,
    poll_id: &PollId,
    caller: &UserId,
) -> Result<Poll, AppError> {
    let poll = load_poll(store, poll_id).await?;
    if !poll.is_owned_by(caller) {
        return Err(AppError::Forbidden);
    }
    Ok(poll)
}

pub async fn create_poll(
    store: &dyn PollStore,
    draft: PollDraft,
    owner: UserId,
    now: DateTime<Utc>,
) -> Result<PollDetailsDTO, AppError> {
    let (poll, options) = Poll::create(draft, owner, now)?;
    store.insert_poll(&poll, &options).await?;
    info!("Poll {} created by {}", poll.id, poll.created_by);
    details(store, poll).await
}

pub async fn get_poll(store: &dyn PollStore, poll_id: &PollId) -> Result<PollDetailsDTO, AppError> {
    let poll = load_poll(store, poll_id).await?;
    details(store, poll).await
}

/// Listing rows carry their own tallies; a poll whose options have all been
/// removed lists with zero counts instead of failing the page.
pub async fn list_polls(
    store: &dyn PollStore,
    filter: &PollFilter,
) -> Result<Vec<PollSummaryDTO>, AppError> {
    let polls = store.list_polls(filter).await?;
    let mut summaries = Vec::with_capacity(polls.len());

    for poll in polls {
        let options = store.options_for(&poll.id).await?;
        let votes = store.votes_for(&poll.id).await?;
        let (total_votes, unique_voters) = match aggregate(&poll, &options, &votes) {
            Ok(result) => (result.total_votes, result.unique_voters),
            Err(AggregateError::NoOptions) => (0, 0),
        };
        summaries.push(PollSummaryDTO {
            poll,
            option_count: options.len(),
            total_votes,
            unique_voters,
        });
    }

    Ok(summaries)
}

pub async fn update_poll(
    store: &dyn PollStore,
    poll_id: &PollId,
    changes: PollChanges,
    caller: &UserId,
    now: DateTime<Utc>,
) -> Result<PollDetailsDTO, AppError> {
    if changes.is_empty() {
        return Err(AppError::Validation("No fields provided to update".to_string()));
    }
    let mut poll = owned_poll(store, poll_id, caller).await?;
    poll.apply(changes, now)?;

    if !store.update_poll(&poll).await? {
        return Err(AppError::PollNotFound);
    }
    info!("Poll {} updated", poll.id);
    details(store, poll).await
}

pub async fn delete_poll(
    store: &dyn PollStore,
    poll_id: &PollId,
    caller: &UserId,
) -> Result<(), AppError> {
    owned_poll(store, poll_id, caller).await?;
    if !store.delete_poll(poll_id).await? {
        return Err(AppError::PollNotFound);
    }
    info!("Poll {} deleted by {}", poll_id, caller);
    Ok(())
}

pub async fn add_option(
    store: &dyn PollStore,
    poll_id: &PollId,
    text: &str,
    caller: &UserId,
) -> Result<PollOption, AppError> {
    let poll = owned_poll(store, poll_id, caller).await?;
    let option = PollOption::new(OptionId::generate(), poll.id, text)?;
    store.insert_option(&option).await?;
    info!("Option {} added to poll {}", option.id, option.poll_id);
    Ok(option)
}

pub async fn rename_option(
    store: &dyn PollStore,
    poll_id: &PollId,
    option_id: &OptionId,
    text: &str,
    caller: &UserId,
) -> Result<PollOption, AppError> {
    let poll = owned_poll(store, poll_id, caller).await?;
    let option = PollOption::new(option_id.clone(), poll.id, text)?;
    if !store.update_option(&option).await? {
        return Err(AppError::OptionNotFound);
    }
    Ok(option)
}

/// Drops an option and its votes, refusing to go below the minimum option count.
pub async fn remove_option(
    store: &dyn PollStore,
    poll_id: &PollId,
    option_id: &OptionId,
    caller: &UserId,
) -> Result<(), AppError> {
    owned_poll(store, poll_id, caller).await?;
    let options = store.options_for(poll_id).await?;
    if !options.iter().any(|o| &o.id == option_id) {
        return Err(AppError::OptionNotFound);
    }
    if options.len() <= MIN_OPTIONS {
        return Err(AppError::Validation(format!(
            "A poll must keep at least {MIN_OPTIONS} options"
        )));
    }
    if !store.delete_option(poll_id, option_id).await? {
        return Err(AppError::OptionNotFound);
    }
    info!("Option {} removed from poll {}", option_id, poll_id);
    Ok(())
}

use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt, TryStreamExt};
use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::{info, warn};

use super::{
    documents::{OptionDocument, PollDocument, VoteDocument},
    PollFilter, PollStore, StoreError, StoreResult, VoteConflict,
};
use crate::models::{OptionId, Poll, PollId, PollOption, UserId, Vote};

const SAME_OPTION_INDEX: &str = "poll_option_user_unique";
const EXCLUSIVE_INDEX: &str = "poll_user_exclusive_unique";
const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed store over the `polls`, `poll_options` and `votes` collections.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<Database>,
    polls: Collection<PollDocument>,
    options: Collection<OptionDocument>,
    votes: Collection<VoteDocument>,
}

impl PollRepository {
    pub fn new(db: Arc<Database>) -> Self {
        let polls = db.collection::<PollDocument>("polls");
        let options = db.collection::<OptionDocument>("poll_options");
        let votes = db.collection::<VoteDocument>("votes");
        Self {
            db,
            polls,
            options,
            votes,
        }
    }

    /// Creates the uniqueness constraints the vote path relies on.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let same_option = IndexModel::builder()
            .keys(doc! { "poll_id": 1, "option_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name(SAME_OPTION_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let exclusive = IndexModel::builder()
            .keys(doc! { "exclusive_key": 1 })
            .options(
                IndexOptions::builder()
                    .name(EXCLUSIVE_INDEX.to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "exclusive_key": { "$type": "string" } })
                    .build(),
            )
            .build();

        self.votes.create_index(same_option).await?;
        self.votes.create_index(exclusive).await?;
        self.options
            .create_index(IndexModel::builder().keys(doc! { "poll_id": 1, "position": 1 }).build())
            .await?;
        self.polls
            .create_index(IndexModel::builder().keys(doc! { "created_by": 1, "created_at": -1 }).build())
            .await?;

        info!("Vote uniqueness indexes in place");
        Ok(())
    }

    async fn collect_polls(&self, filter: Document, page: &PollFilter) -> StoreResult<Vec<Poll>> {
        let docs: Vec<PollDocument> = self
            .polls
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(u64::from(page.offset))
            .limit(i64::from(page.limit))
            .await?
            .try_collect()
            .await?;

        docs.into_iter()
            .map(|d| Poll::try_from(d).map_err(StoreError::from))
            .collect()
    }

    async fn next_position(&self, poll_id: &PollId) -> StoreResult<i64> {
        let last = self
            .options
            .find_one(doc! { "poll_id": poll_id.as_str() })
            .sort(doc! { "position": -1 })
            .await?;
        Ok(last.map(|o| o.position + 1).unwrap_or(0))
    }
}

/// Maps a duplicate-key write error onto the constraint that fired.
fn vote_conflict(err: &mongodb::error::Error) -> Option<VoteConflict> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY =>
        {
            Some(conflict_from_message(&write_error.message))
        }
        _ => None,
    }
}

// the server names the violated index in the E11000 message
fn conflict_from_message(message: &str) -> VoteConflict {
    if message.contains(EXCLUSIVE_INDEX) {
        VoteConflict::SinglePoll
    } else {
        VoteConflict::SameOption
    }
}

impl PollStore for PollRepository {
    fn find_poll<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<Option<Poll>>> {
        async move {
            let found = self
                .polls
                .find_one(doc! { "_id": poll_id.as_str() })
                .await?;
            Ok(found.map(Poll::try_from).transpose()?)
        }
        .boxed()
    }

    fn list_polls<'a>(&'a self, filter: &'a PollFilter) -> BoxFuture<'a, StoreResult<Vec<Poll>>> {
        async move {
            let mut query = Document::new();
            if filter.public_only {
                query.insert("is_public", true);
                query.insert("is_active", true);
            }
            if let Some(owner) = &filter.owner {
                query.insert("created_by", owner.as_str());
            }
            self.collect_polls(query, filter).await
        }
        .boxed()
    }

    fn insert_poll<'a>(
        &'a self,
        poll: &'a Poll,
        options: &'a [PollOption],
    ) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.polls.insert_one(PollDocument::from(poll)).await?;

            let docs: Vec<OptionDocument> = options
                .iter()
                .enumerate()
                .map(|(position, option)| OptionDocument::new(option, position as i64))
                .collect();

            if let Err(e) = self.options.insert_many(docs).await {
                // no multi-document transaction here, so undo the poll by hand
                warn!("Option insert failed for poll {}, rolling back: {}", poll.id, e);
                self.polls.delete_one(doc! { "_id": poll.id.as_str() }).await?;
                return Err(e.into());
            }

            info!("Poll {} stored with {} options", poll.id, options.len());
            Ok(())
        }
        .boxed()
    }

    fn update_poll<'a>(&'a self, poll: &'a Poll) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = self
                .polls
                .replace_one(doc! { "_id": poll.id.as_str() }, PollDocument::from(poll))
                .await?;
            Ok(result.matched_count > 0)
        }
        .boxed()
    }

    fn delete_poll<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let scope = doc! { "poll_id": poll_id.as_str() };
            let votes = self.votes.delete_many(scope.clone()).await?;
            let options = self.options.delete_many(scope).await?;
            let poll = self.polls.delete_one(doc! { "_id": poll_id.as_str() }).await?;

            info!(
                "Deleted poll {} ({} options, {} votes)",
                poll_id, options.deleted_count, votes.deleted_count
            );
            Ok(poll.deleted_count > 0)
        }
        .boxed()
    }

    fn options_for<'a>(
        &'a self,
        poll_id: &'a PollId,
    ) -> BoxFuture<'a, StoreResult<Vec<PollOption>>> {
        async move {
            let docs: Vec<OptionDocument> = self
                .options
                .find(doc! { "poll_id": poll_id.as_str() })
                .sort(doc! { "position": 1 })
                .await?
                .try_collect()
                .await?;

            docs.into_iter()
                .map(|d| PollOption::try_from(d).map_err(StoreError::from))
                .collect()
        }
        .boxed()
    }

    fn insert_option<'a>(&'a self, option: &'a PollOption) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let position = self.next_position(&option.poll_id).await?;
            self.options
                .insert_one(OptionDocument::new(option, position))
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn update_option<'a>(&'a self, option: &'a PollOption) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = self
                .options
                .update_one(
                    doc! { "_id": option.id.as_str(), "poll_id": option.poll_id.as_str() },
                    doc! { "$set": { "text": option.text.as_str() } },
                )
                .await?;
            Ok(result.matched_count > 0)
        }
        .boxed()
    }

    fn delete_option<'a>(
        &'a self,
        poll_id: &'a PollId,
        option_id: &'a OptionId,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let removed = self
                .options
                .delete_one(doc! { "_id": option_id.as_str(), "poll_id": poll_id.as_str() })
                .await?;
            if removed.deleted_count == 0 {
                return Ok(false);
            }
            self.votes
                .delete_many(doc! { "poll_id": poll_id.as_str(), "option_id": option_id.as_str() })
                .await?;
            Ok(true)
        }
        .boxed()
    }

    fn votes_for<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<Vec<Vote>>> {
        async move {
            let docs: Vec<VoteDocument> = self
                .votes
                .find(doc! { "poll_id": poll_id.as_str() })
                .await?
                .try_collect()
                .await?;

            docs.into_iter()
                .map(|d| Vote::try_from(d).map_err(StoreError::from))
                .collect()
        }
        .boxed()
    }

    fn user_votes_for<'a>(
        &'a self,
        poll_id: &'a PollId,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, StoreResult<Vec<Vote>>> {
        async move {
            let docs: Vec<VoteDocument> = self
                .votes
                .find(doc! { "poll_id": poll_id.as_str(), "user_id": user_id.as_str() })
                .sort(doc! { "created_at": 1 })
                .await?
                .try_collect()
                .await?;

            docs.into_iter()
                .map(|d| Vote::try_from(d).map_err(StoreError::from))
                .collect()
        }
        .boxed()
    }

    fn insert_vote<'a>(
        &'a self,
        vote: &'a Vote,
        exclusive: bool,
    ) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            match self.votes.insert_one(VoteDocument::new(vote, exclusive)).await {
                Ok(_) => Ok(()),
                Err(e) => match vote_conflict(&e) {
                    Some(conflict) => {
                        warn!(
                            "Vote by {} on poll {} lost a uniqueness race: {:?}",
                            vote.user_id, vote.poll_id, conflict
                        );
                        Err(StoreError::Conflict(conflict))
                    }
                    None => Err(e.into()),
                },
            }
        }
        .boxed()
    }

    fn delete_vote<'a>(
        &'a self,
        poll_id: &'a PollId,
        option_id: &'a OptionId,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let result = self
                .votes
                .delete_one(doc! {
                    "poll_id": poll_id.as_str(),
                    "option_id": option_id.as_str(),
                    "user_id": user_id.as_str(),
                })
                .await?;
            Ok(result.deleted_count > 0)
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            self.db.run_command(doc! { "ping": 1 }).await?;
            Ok(())
        }
        .boxed()
    }
}

use futures::{future::BoxFuture, FutureExt};
use tokio::sync::Mutex;

use super::{PollFilter, PollStore, StoreError, StoreResult, VoteConflict};
use crate::models::{OptionId, Poll, PollId, PollOption, UserId, Vote};

struct StoredVote {
    vote: Vote,
    exclusive_key: Option<String>,
}

#[derive(Default)]
struct Tables {
    polls: Vec<Poll>,
    options: Vec<PollOption>,
    votes: Vec<StoredVote>,
}

/// Process-local store with the same uniqueness rules as the MongoDB one.
/// Every call holds one lock, so check-then-insert is atomic.
#[derive(Default)]
pub struct InMemoryPollStore {
    tables: Mutex<Tables>,
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PollStore for InMemoryPollStore {
    fn find_poll<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<Option<Poll>>> {
        async move {
            let tables = self.tables.lock().await;
            Ok(tables.polls.iter().find(|p| &p.id == poll_id).cloned())
        }
        .boxed()
    }

    fn list_polls<'a>(&'a self, filter: &'a PollFilter) -> BoxFuture<'a, StoreResult<Vec<Poll>>> {
        async move {
            let tables = self.tables.lock().await;
            let mut polls: Vec<Poll> = tables
                .polls
                .iter()
                .filter(|p| !filter.public_only || (p.is_public && p.is_active))
                .filter(|p| filter.owner.as_ref().map_or(true, |owner| &p.created_by == owner))
                .cloned()
                .collect();
            polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(polls
                .into_iter()
                .skip(filter.offset as usize)
                .take(filter.limit as usize)
                .collect())
        }
        .boxed()
    }

    fn insert_poll<'a>(
        &'a self,
        poll: &'a Poll,
        options: &'a [PollOption],
    ) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let mut tables = self.tables.lock().await;
            if tables.polls.iter().any(|p| p.id == poll.id) {
                return Err(StoreError::Backend(format!("poll {} already exists", poll.id)));
            }
            tables.polls.push(poll.clone());
            tables.options.extend(options.iter().cloned());
            Ok(())
        }
        .boxed()
    }

    fn update_poll<'a>(&'a self, poll: &'a Poll) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let mut tables = self.tables.lock().await;
            match tables.polls.iter_mut().find(|p| p.id == poll.id) {
                Some(stored) => {
                    *stored = poll.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .boxed()
    }

    fn delete_poll<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let mut tables = self.tables.lock().await;
            let before = tables.polls.len();
            tables.polls.retain(|p| &p.id != poll_id);
            tables.options.retain(|o| &o.poll_id != poll_id);
            tables.votes.retain(|v| &v.vote.poll_id != poll_id);
            Ok(tables.polls.len() < before)
        }
        .boxed()
    }

    fn options_for<'a>(
        &'a self,
        poll_id: &'a PollId,
    ) -> BoxFuture<'a, StoreResult<Vec<PollOption>>> {
        async move {
            let tables = self.tables.lock().await;
            Ok(tables
                .options
                .iter()
                .filter(|o| &o.poll_id == poll_id)
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn insert_option<'a>(&'a self, option: &'a PollOption) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.tables.lock().await.options.push(option.clone());
            Ok(())
        }
        .boxed()
    }

    fn update_option<'a>(&'a self, option: &'a PollOption) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let mut tables = self.tables.lock().await;
            match tables
                .options
                .iter_mut()
                .find(|o| o.id == option.id && o.poll_id == option.poll_id)
            {
                Some(stored) => {
                    stored.text = option.text.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .boxed()
    }

    fn delete_option<'a>(
        &'a self,
        poll_id: &'a PollId,
        option_id: &'a OptionId,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let mut tables = self.tables.lock().await;
            let before = tables.options.len();
            tables
                .options
                .retain(|o| !(&o.id == option_id && &o.poll_id == poll_id));
            if tables.options.len() == before {
                return Ok(false);
            }
            tables
                .votes
                .retain(|v| !(&v.vote.poll_id == poll_id && &v.vote.option_id == option_id));
            Ok(true)
        }
        .boxed()
    }

    fn votes_for<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<Vec<Vote>>> {
        async move {
            let tables = self.tables.lock().await;
            Ok(tables
                .votes
                .iter()
                .filter(|v| &v.vote.poll_id == poll_id)
                .map(|v| v.vote.clone())
                .collect())
        }
        .boxed()
    }

    fn user_votes_for<'a>(
        &'a self,
        poll_id: &'a PollId,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, StoreResult<Vec<Vote>>> {
        async move {
            let tables = self.tables.lock().await;
            Ok(tables
                .votes
                .iter()
                .filter(|v| &v.vote.poll_id == poll_id && &v.vote.user_id == user_id)
                .map(|v| v.vote.clone())
                .collect())
        }
        .boxed()
    }

    fn insert_vote<'a>(
        &'a self,
        vote: &'a Vote,
        exclusive: bool,
    ) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let mut tables = self.tables.lock().await;

            let same_option = tables.votes.iter().any(|v| {
                v.vote.poll_id == vote.poll_id
                    && v.vote.option_id == vote.option_id
                    && v.vote.user_id == vote.user_id
            });
            if same_option {
                return Err(StoreError::Conflict(VoteConflict::SameOption));
            }

            let exclusive_key = exclusive.then(|| vote.exclusive_key());
            if let Some(key) = &exclusive_key {
                if tables
                    .votes
                    .iter()
                    .any(|v| v.exclusive_key.as_ref() == Some(key))
                {
                    return Err(StoreError::Conflict(VoteConflict::SinglePoll));
                }
            }

            tables.votes.push(StoredVote {
                vote: vote.clone(),
                exclusive_key,
            });
            Ok(())
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
            let mut tables = self.tables.lock().await;
            let position = tables.votes.iter().position(|v| {
                &v.vote.poll_id == poll_id
                    && &v.vote.option_id == option_id
                    && &v.vote.user_id == user_id
            });
            match position {
                Some(index) => {
                    tables.votes.remove(index);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        async { Ok(()) }.boxed()
    }
}

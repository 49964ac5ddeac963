use futures::future::BoxFuture;
use thiserror::Error;

use crate::{
    models::{ModelError, OptionId, Poll, PollId, PollOption, UserId, Vote},
    services::eligibility::DenyReason,
};

pub mod documents;
pub mod memory;
pub mod poll_repository;

pub use memory::InMemoryPollStore;
pub use poll_repository::PollRepository;

/// Which uniqueness rule rejected a vote insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteConflict {
    /// (poll, option, user) already present
    SameOption,
    /// (poll, user) already present on a single-vote poll
    SinglePoll,
}

impl From<VoteConflict> for DenyReason {
    fn from(conflict: VoteConflict) -> Self {
        match conflict {
            VoteConflict::SameOption => DenyReason::DuplicateOption,
            VoteConflict::SinglePoll => DenyReason::SingleVoteExceeded,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Vote rejected by uniqueness constraint: {0:?}")]
    Conflict(VoteConflict),

    #[error("Malformed record: {0}")]
    Malformed(#[from] ModelError),

    #[error("Database error: {0}")]
    Backend(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct PollFilter {
    pub limit: u32,
    pub offset: u32,
    /// Public and still active polls only
    pub public_only: bool,
    pub owner: Option<UserId>,
}

/// Everything the service needs from persistence. Handed around as
/// `Arc<dyn PollStore>` so handlers never reach for a global client.
pub trait PollStore: Send + Sync {
    fn find_poll<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<Option<Poll>>>;

    /// Newest first.
    fn list_polls<'a>(&'a self, filter: &'a PollFilter) -> BoxFuture<'a, StoreResult<Vec<Poll>>>;

    fn insert_poll<'a>(
        &'a self,
        poll: &'a Poll,
        options: &'a [PollOption],
    ) -> BoxFuture<'a, StoreResult<()>>;

    fn update_poll<'a>(&'a self, poll: &'a Poll) -> BoxFuture<'a, StoreResult<bool>>;

    /// Removes the poll together with its options and votes.
    fn delete_poll<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<bool>>;

    /// Options in the order they were added.
    fn options_for<'a>(&'a self, poll_id: &'a PollId)
        -> BoxFuture<'a, StoreResult<Vec<PollOption>>>;

    fn insert_option<'a>(&'a self, option: &'a PollOption) -> BoxFuture<'a, StoreResult<()>>;

    fn update_option<'a>(&'a self, option: &'a PollOption) -> BoxFuture<'a, StoreResult<bool>>;

    /// Removes the option and every vote cast for it.
    fn delete_option<'a>(
        &'a self,
        poll_id: &'a PollId,
        option_id: &'a OptionId,
    ) -> BoxFuture<'a, StoreResult<bool>>;

    fn votes_for<'a>(&'a self, poll_id: &'a PollId) -> BoxFuture<'a, StoreResult<Vec<Vote>>>;

    /// One caller's votes on one poll, oldest first.
    fn user_votes_for<'a>(
        &'a self,
        poll_id: &'a PollId,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, StoreResult<Vec<Vote>>>;

    /// `exclusive` additionally enforces one vote per (poll, user).
    /// Constraint violations come back as [`StoreError::Conflict`].
    fn insert_vote<'a>(&'a self, vote: &'a Vote, exclusive: bool)
        -> BoxFuture<'a, StoreResult<()>>;

    fn delete_vote<'a>(
        &'a self,
        poll_id: &'a PollId,
        option_id: &'a OptionId,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, StoreResult<bool>>;

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>>;
}

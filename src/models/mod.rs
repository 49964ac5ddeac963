use thiserror::Error;

pub mod ids;
pub mod poll;
pub mod vote;

pub use ids::{OptionId, PollId, UserId, VoteId};
pub use poll::{Poll, PollChanges, PollDraft, PollOption, MIN_OPTIONS};
pub use vote::Vote;

/// Rejections raised while building a record from untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),

    #[error("Poll title must not be blank")]
    BlankTitle,

    #[error("Option text must not be blank")]
    BlankOptionText,

    #[error("A poll needs at least {MIN_OPTIONS} options, got {0}")]
    TooFewOptions(usize),

    #[error("Expiry must lie in the future")]
    ExpiryInPast,

    #[error("Option {option} does not belong to poll {poll}")]
    OptionPollMismatch { option: OptionId, poll: PollId },

    #[error("Invalid timestamp in {0}")]
    InvalidTimestamp(&'static str),
}

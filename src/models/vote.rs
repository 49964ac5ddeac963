use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ModelError, OptionId, Poll, PollId, PollOption, UserId, VoteId};

/// One user's choice of one option on one poll. Never mutated once cast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn cast(
        poll: &Poll,
        option: &PollOption,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        if option.poll_id != poll.id {
            return Err(ModelError::OptionPollMismatch {
                option: option.id.clone(),
                poll: poll.id.clone(),
            });
        }
        Ok(Self {
            id: VoteId::generate(),
            poll_id: poll.id.clone(),
            option_id: option.id.clone(),
            user_id,
            created_at: now,
        })
    }

    /// Key the store uses to keep single-vote polls at one row per user.
    pub fn exclusive_key(&self) -> String {
        format!("{}:{}", self.poll_id, self.user_id)
    }
}

//! On-disk shapes of the three collections and their checked conversion
//! into domain records.

use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{ModelError, OptionId, Poll, PollId, PollOption, UserId, Vote, VoteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_public: bool,
    pub allow_multiple_votes: bool,
    pub expires_at: Option<BsonDateTime>,
    /// References the identity provider's user id
    pub created_by: String,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    /// References `_id` in the polls collection
    pub poll_id: String,
    pub text: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub poll_id: String,
    pub option_id: String,
    pub user_id: String,
    pub created_at: BsonDateTime,
    /// Only present on single-vote polls; covered by a partial unique index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_key: Option<String>,
}

fn to_bson(date: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(date.timestamp_millis())
}

fn from_bson(date: BsonDateTime, field: &'static str) -> Result<DateTime<Utc>, ModelError> {
    DateTime::from_timestamp_millis(date.timestamp_millis())
        .ok_or(ModelError::InvalidTimestamp(field))
}

impl From<&Poll> for PollDocument {
    fn from(poll: &Poll) -> Self {
        Self {
            id: poll.id.to_string(),
            title: poll.title.clone(),
            description: poll.description.clone(),
            is_active: poll.is_active,
            is_public: poll.is_public,
            allow_multiple_votes: poll.allow_multiple_votes,
            expires_at: poll.expires_at.map(to_bson),
            created_by: poll.created_by.to_string(),
            created_at: to_bson(poll.created_at),
            updated_at: to_bson(poll.updated_at),
        }
    }
}

impl TryFrom<PollDocument> for Poll {
    type Error = ModelError;

    fn try_from(doc: PollDocument) -> Result<Self, Self::Error> {
        let created_at = from_bson(doc.created_at, "created_at")?;
        let mut poll = Poll::new(
            PollId::parse(&doc.id)?,
            &doc.title,
            UserId::parse(&doc.created_by)?,
            created_at,
        )?;
        poll.description = doc.description;
        poll.is_active = doc.is_active;
        poll.is_public = doc.is_public;
        poll.allow_multiple_votes = doc.allow_multiple_votes;
        poll.expires_at = doc
            .expires_at
            .map(|at| from_bson(at, "expires_at"))
            .transpose()?;
        poll.updated_at = from_bson(doc.updated_at, "updated_at")?;
        Ok(poll)
    }
}

impl OptionDocument {
    pub fn new(option: &PollOption, position: i64) -> Self {
        Self {
            id: option.id.to_string(),
            poll_id: option.poll_id.to_string(),
            text: option.text.clone(),
            position,
        }
    }
}

impl TryFrom<OptionDocument> for PollOption {
    type Error = ModelError;

    fn try_from(doc: OptionDocument) -> Result<Self, Self::Error> {
        PollOption::new(
            OptionId::parse(&doc.id)?,
            PollId::parse(&doc.poll_id)?,
            &doc.text,
        )
    }
}

impl VoteDocument {
    pub fn new(vote: &Vote, exclusive: bool) -> Self {
        Self {
            id: vote.id.to_string(),
            poll_id: vote.poll_id.to_string(),
            option_id: vote.option_id.to_string(),
            user_id: vote.user_id.to_string(),
            created_at: to_bson(vote.created_at),
            exclusive_key: exclusive.then(|| vote.exclusive_key()),
        }
    }
}

impl TryFrom<VoteDocument> for Vote {
    type Error = ModelError;

    fn try_from(doc: VoteDocument) -> Result<Self, Self::Error> {
        Ok(Vote {
            id: VoteId::parse(&doc.id)?,
            poll_id: PollId::parse(&doc.poll_id)?,
            option_id: OptionId::parse(&doc.option_id)?,
            user_id: UserId::parse(&doc.user_id)?,
            created_at: from_bson(doc.created_at, "created_at")?,
        })
    }
}

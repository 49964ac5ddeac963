use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ModelError, OptionId, PollId, UserId};

/// Smallest option set a poll may be created with or trimmed down to.
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub description: Option<String>,
    /// Accepts votes only while true and not expired
    pub is_active: bool,
    /// Listing visibility, not consulted by the vote path
    pub is_public: bool,
    pub allow_multiple_votes: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Poll {
    /// A fresh, active, public, single-vote poll without expiry.
    pub fn new(
        id: PollId,
        title: &str,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            id,
            title: clean_title(title)?,
            description: None,
            is_active: true,
            is_public: true,
            allow_multiple_votes: false,
            expires_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates a creation request and splits it into the poll and its ordered options.
    /// Blank option entries are dropped before the minimum is checked.
    pub fn create(
        draft: PollDraft,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<PollOption>), ModelError> {
        let mut poll = Self::new(PollId::generate(), &draft.title, owner, now)?;
        poll.description = clean_description(draft.description);
        poll.is_public = draft.is_public;
        poll.allow_multiple_votes = draft.allow_multiple_votes;
        if let Some(expiry) = draft.expires_at {
            if expiry <= now {
                return Err(ModelError::ExpiryInPast);
            }
            poll.expires_at = Some(expiry);
        }

        let texts: Vec<&String> = draft
            .options
            .iter()
            .filter(|text| !text.trim().is_empty())
            .collect();
        if texts.len() < MIN_OPTIONS {
            return Err(ModelError::TooFewOptions(texts.len()));
        }

        let options = texts
            .into_iter()
            .map(|text| PollOption::new(OptionId::generate(), poll.id.clone(), text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((poll, options))
    }

    /// Closed when deactivated, or when the expiry is at or before `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.expires_at {
            Some(expiry) => expiry > now,
            None => true,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.created_by == user_id
    }

    pub fn apply(&mut self, changes: PollChanges, now: DateTime<Utc>) -> Result<(), ModelError> {
        if let Some(title) = changes.title {
            self.title = clean_title(&title)?;
        }
        if let Some(description) = changes.description {
            self.description = clean_description(Some(description));
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        if let Some(is_public) = changes.is_public {
            self.is_public = is_public;
        }
        if let Some(allow) = changes.allow_multiple_votes {
            self.allow_multiple_votes = allow;
        }
        // `Some(None)` clears the expiry
        if let Some(expiry) = changes.expires_at {
            self.expires_at = expiry;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn clean_title(title: &str) -> Result<String, ModelError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ModelError::BlankTitle);
    }
    Ok(title.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: OptionId,
    pub poll_id: PollId,
    pub text: String,
}

impl PollOption {
    pub fn new(id: OptionId, poll_id: PollId, text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::BlankOptionText);
        }
        Ok(Self {
            id,
            poll_id,
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollDraft {
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub allow_multiple_votes: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PollChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub allow_multiple_votes: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl PollChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
            && self.is_public.is_none()
            && self.allow_multiple_votes.is_none()
            && self.expires_at.is_none()
    }
}

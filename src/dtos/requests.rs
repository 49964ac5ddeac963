use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::{
    error::AppError,
    models::{OptionId, PollChanges, PollDraft},
};

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ListPollsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub public: Option<bool>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ResultQueryParams {
    pub live: Option<bool>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VoteDTO {
    #[serde(default)]
    pub option_id: String,
}

impl VoteDTO {
    pub fn option_id(&self) -> Result<OptionId, AppError> {
        OptionId::parse(&self.option_id)
            .map_err(|_| AppError::Validation("Option ID is required".to_string()))
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RetractVoteQuery {
    #[serde(default)]
    pub option_id: String,
}

impl RetractVoteQuery {
    pub fn option_id(&self) -> Result<OptionId, AppError> {
        OptionId::parse(&self.option_id)
            .map_err(|_| AppError::Validation("Option ID is required".to_string()))
    }
}

fn default_public() -> bool {
    true
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollDTO {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub allow_multiple_votes: bool,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl From<CreatePollDTO> for PollDraft {
    fn from(dto: CreatePollDTO) -> Self {
        PollDraft {
            title: dto.title,
            description: dto.description,
            is_public: dto.is_public,
            allow_multiple_votes: dto.allow_multiple_votes,
            expires_at: dto.expires_at,
            options: dto.options,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollDTO {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub allow_multiple_votes: Option<bool>,
    /// Absent keeps the expiry, `null` removes it.
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

// a field that is present, even as null, becomes `Some`
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<UpdatePollDTO> for PollChanges {
    fn from(dto: UpdatePollDTO) -> Self {
        PollChanges {
            title: dto.title,
            description: dto.description,
            is_active: dto.is_active,
            is_public: dto.is_public,
            allow_multiple_votes: dto.allow_multiple_votes,
            expires_at: dto.expires_at,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct OptionDTO {
    pub text: String,
}

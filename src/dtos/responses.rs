use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::{Poll, PollOption, Vote},
    services::{eligibility::Eligibility, results::AggregatedResult},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status: status.as_u16() as i32,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now(),
            error: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummaryDTO {
    #[serde(flatten)]
    pub poll: Poll,
    pub option_count: usize,
    pub total_votes: u64,
    pub unique_voters: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetailsDTO {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
    pub results: AggregatedResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVotesDTO {
    pub votes: Vec<Vote>,
    pub eligibility: Eligibility,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDTO {
    pub status: &'static str,
    pub uptime_secs: u64,
}

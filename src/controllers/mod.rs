use crate::{
    error::AppError,
    models::{OptionId, PollId},
};

pub mod health_controller;
pub mod poll_controller;
pub mod vote_controller;

// a blank path segment can't name anything we store
pub(crate) fn parse_poll_id(raw: &str) -> Result<PollId, AppError> {
    PollId::parse(raw).map_err(|_| AppError::PollNotFound)
}

pub(crate) fn parse_option_id(raw: &str) -> Result<OptionId, AppError> {
    OptionId::parse(raw).map_err(|_| AppError::OptionNotFound)
}

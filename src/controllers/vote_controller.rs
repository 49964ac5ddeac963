use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;

use super::parse_poll_id;
use crate::{
    config::startup::AppState,
    dtos::{
        requests::{RetractVoteQuery, VoteDTO},
        responses::{ApiResponse, MyVotesDTO},
    },
    error::AppError,
    middleware::auth::{AuthUser, Caller},
    services::{results::AggregatedResult, votes},
};

//?POST:: api/polls/poll_id/vote
pub async fn cast_vote(
    Extension(state): Extension<AppState>,
    Caller(caller): Caller,
    Path(poll_id): Path<String>,
    Json(payload): Json<VoteDTO>,
) -> Result<Json<ApiResponse<AggregatedResult>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let option_id = payload.option_id()?;
    let result = votes::cast_vote(
        state.store.as_ref(),
        &poll_id,
        &option_id,
        caller.as_ref(),
        Utc::now(),
    )
    .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Vote cast successfully",
        result,
    )))
}

//-DELETE:: api/polls/poll_id/vote?optionId=
pub async fn retract_vote(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path(poll_id): Path<String>,
    Query(query): Query<RetractVoteQuery>,
) -> Result<Json<ApiResponse<AggregatedResult>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let option_id = query.option_id()?;
    let result = votes::retract_vote(
        state.store.as_ref(),
        &poll_id,
        &option_id,
        &user_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Vote retracted successfully",
        result,
    )))
}

//*GET:: api/polls/poll_id/votes/me
pub async fn get_my_votes(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path(poll_id): Path<String>,
) -> Result<Json<ApiResponse<MyVotesDTO>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let mine = votes::my_votes(state.store.as_ref(), &poll_id, &user_id, Utc::now()).await?;

    let message = if mine.eligibility.allowed {
        "Can vote"
    } else {
        "Cannot vote"
    };
    Ok(Json(ApiResponse::success(StatusCode::OK, message, mine)))
}

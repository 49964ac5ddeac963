use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{sse::Event, IntoResponse, Response, Sse},
    Extension, Json,
};
use chrono::Utc;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use super::{parse_option_id, parse_poll_id};
use crate::{
    config::startup::AppState,
    dtos::{
        requests::{CreatePollDTO, ListPollsQuery, OptionDTO, ResultQueryParams, UpdatePollDTO},
        responses::{ApiResponse, PollDetailsDTO, PollSummaryDTO},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{PollId, PollOption},
    repositories::{PollFilter, PollStore},
    services::{polls, results::AggregatedResult, votes},
};

//*GET:: api/polls
pub async fn get_all_polls(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListPollsQuery>,
) -> Result<Json<ApiResponse<Vec<PollSummaryDTO>>>, AppError> {
    let filter = PollFilter {
        limit: state.settings.page_size(query.limit),
        offset: query.offset.unwrap_or(0),
        public_only: query.public.unwrap_or(false),
        owner: None,
    };
    let polls = polls::list_polls(state.store.as_ref(), &filter).await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "All polls fetched successfully",
        polls,
    )))
}

//*GET:: api/polls/manage
pub async fn manage_all_polls(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListPollsQuery>,
) -> Result<Json<ApiResponse<Vec<PollSummaryDTO>>>, AppError> {
    let filter = PollFilter {
        limit: state.settings.page_size(query.limit),
        offset: query.offset.unwrap_or(0),
        public_only: false,
        owner: Some(user_id),
    };
    let polls = polls::list_polls(state.store.as_ref(), &filter).await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "User polls fetched successfully",
        polls,
    )))
}

//?POST:: api/polls
pub async fn create_new_poll(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePollDTO>,
) -> Result<(StatusCode, Json<ApiResponse<PollDetailsDTO>>), AppError> {
    let poll = polls::create_poll(state.store.as_ref(), payload.into(), user_id, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            StatusCode::CREATED,
            "Poll created successfully",
            poll,
        )),
    ))
}

//*GET:: api/polls/poll_id
pub async fn get_poll_by_id(
    Extension(state): Extension<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<ApiResponse<PollDetailsDTO>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let poll = polls::get_poll(state.store.as_ref(), &poll_id).await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Poll retrieved successfully",
        poll,
    )))
}

//?PATCH:: api/polls/poll_id
pub async fn update_poll_by_id(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path(poll_id): Path<String>,
    Json(payload): Json<UpdatePollDTO>,
) -> Result<Json<ApiResponse<PollDetailsDTO>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let poll = polls::update_poll(
        state.store.as_ref(),
        &poll_id,
        payload.into(),
        &user_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Poll updated successfully",
        poll,
    )))
}

//-DELETE:: api/polls/poll_id
pub async fn delete_poll_by_id(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path(poll_id): Path<String>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    polls::delete_poll(state.store.as_ref(), &poll_id, &user_id).await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Poll deleted successfully",
        poll_id.to_string(),
    )))
}

//?POST:: api/polls/poll_id/options
pub async fn add_poll_option(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path(poll_id): Path<String>,
    Json(payload): Json<OptionDTO>,
) -> Result<(StatusCode, Json<ApiResponse<PollOption>>), AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let option = polls::add_option(state.store.as_ref(), &poll_id, &payload.text, &user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            StatusCode::CREATED,
            "Option added successfully",
            option,
        )),
    ))
}

//?PATCH:: api/polls/poll_id/options/option_id
pub async fn rename_poll_option(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path((poll_id, option_id)): Path<(String, String)>,
    Json(payload): Json<OptionDTO>,
) -> Result<Json<ApiResponse<PollOption>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let option_id = parse_option_id(&option_id)?;
    let option = polls::rename_option(
        state.store.as_ref(),
        &poll_id,
        &option_id,
        &payload.text,
        &user_id,
    )
    .await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Option updated successfully",
        option,
    )))
}

//-DELETE:: api/polls/poll_id/options/option_id
pub async fn remove_poll_option(
    Extension(state): Extension<AppState>,
    AuthUser(user_id): AuthUser,
    Path((poll_id, option_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;
    let option_id = parse_option_id(&option_id)?;
    polls::remove_option(state.store.as_ref(), &poll_id, &option_id, &user_id).await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Option removed successfully",
        option_id.to_string(),
    )))
}

//*GET:: api/polls/poll_id/results
pub async fn get_poll_result(
    Extension(state): Extension<AppState>,
    Path(poll_id): Path<String>,
    Query(filters): Query<ResultQueryParams>,
) -> Result<Response, AppError> {
    let poll_id = parse_poll_id(&poll_id)?;

    //* Live results -> keep pushing fresh tallies until the client goes away
    if let Some(true) = filters.live {
        votes::load_poll(state.store.as_ref(), &poll_id).await?;
        let stream = start_sse(
            state.store.clone(),
            poll_id,
            state.settings.live_results_interval,
        );
        return Ok(stream.into_response());
    }

    let result = votes::poll_results(state.store.as_ref(), &poll_id).await?;
    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Poll results retrieved successfully",
        result,
    ))
    .into_response())
}

fn result_event(result: Result<AggregatedResult, AppError>) -> Event {
    match result.map(|r| serde_json::to_string(&r)) {
        Ok(Ok(json)) => Event::default().data(json).event("poll-update"),
        Ok(Err(e)) => {
            warn!("Could not serialize live results: {}", e);
            Event::default().data("Error serializing poll results").event("error")
        }
        Err(e) => Event::default().data(e.code()).event("error"),
    }
}

pub fn start_sse(
    store: Arc<dyn PollStore>,
    poll_id: PollId,
    interval: Duration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(interval))
        .then(move |_| {
            let store = store.clone();
            let poll_id = poll_id.clone();

            async move {
                let result = votes::poll_results(store.as_ref(), &poll_id).await;
                Ok::<_, Infallible>(result_event(result))
            }
        });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(interval)
            .text("keep-alive-text"),
    )
}

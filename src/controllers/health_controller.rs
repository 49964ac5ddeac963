use axum::{http::StatusCode, Extension, Json};

use crate::{
    config::startup::AppState,
    dtos::responses::{ApiResponse, HealthDTO},
    error::AppError,
};

//*GET:: health
pub async fn health_check(
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<HealthDTO>>, AppError> {
    state.store.ping().await?;

    Ok(Json(ApiResponse::success(
        StatusCode::OK,
        "Backend is running",
        HealthDTO {
            status: "ok",
            uptime_secs: state.started_at.elapsed().as_secs(),
        },
    )))
}

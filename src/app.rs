use axum::{routing::get, Extension, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::startup::AppState, controllers::health_controller::health_check,
    routes::poll_route::poll_router,
};

pub fn create_app(app_state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/polls", poll_router())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
        .layer(cors)
}

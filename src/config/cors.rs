use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::cors::CorsLayer;

use super::settings::ConfigError;

pub fn init_cors(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| ConfigError::Invalid {
            key: "CORS_ORIGIN",
            reason: e.to_string(),
        })?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
        .allow_credentials(true)
        .allow_origin(origin);

    Ok(cors)
}

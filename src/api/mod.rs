//! API 模块
//!
//! 提供 REST API 支持。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use crate::api::handlers::character_handler::api_root;
use crate::error::AppError;
use crate::observability::{create_observability_router, metrics_middleware};
use crate::security::middleware::security_headers_middleware;
use axum::{Router, http::HeaderValue, routing::get};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// 根据配置构建 CORS 层，空列表或 "*" 放行所有来源
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(app_state: AppState) -> Router {
    let server = &app_state.config.server;
    let cors = cors_layer(&server.cors_origins);
    let timeout = Duration::from_secs(server.request_timeout.max(1));

    let api = Router::new()
        .merge(routes::character_routes::create_character_router())
        .merge(routes::story_routes::create_story_router());

    Router::new()
        .route("/api/", get(api_root))
        .nest("/api", api)
        .with_state(app_state.clone())
        .merge(create_observability_router(app_state.observability()))
        .layer(axum::middleware::from_fn_with_state(
            app_state.metrics.clone(),
            metrics_middleware,
        ))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn initialize_api(app_state: AppState) -> Result<Router, AppError> {
    tracing::info!("Initializing API router...");
    Ok(create_router(app_state))
}

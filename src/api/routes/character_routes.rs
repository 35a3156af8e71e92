//! Character Routes
//!
//! 角色创建与查询路由。

use crate::api::handlers::character_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建角色路由器
pub fn create_character_router() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route("/characters", post(create_character))
        .route("/characters/options", get(character_options))
        .route("/characters/:id", get(get_character))
}

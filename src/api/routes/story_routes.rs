//! Story Routes
//!
//! 会话开始、选择提交和历史查询路由。

use crate::api::handlers::story_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建故事路由器
pub fn create_story_router() -> Router<AppState> {
    Router::new()
        .route("/story/start/:character_id", post(start_story))
        .route("/story/choice/:session_id", post(make_choice))
        .route("/story/history/:session_id", get(story_history))
}

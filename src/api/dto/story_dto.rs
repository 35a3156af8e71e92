//! 故事 DTO
//!
//! 开始会话与提交选择的请求和响应结构。

use serde::{Deserialize, Serialize};

use crate::models::story::StoryRecord;

/// 开始会话响应
#[derive(Debug, Serialize, Deserialize)]
pub struct StartStoryResponse {
    /// 会话 ID，后续请求使用
    pub session_id: String,
    /// 开场故事
    pub story: StoryRecord,
}

/// 提交选择请求
#[derive(Debug, Deserialize)]
pub struct ChoiceRequest {
    pub choice_text: String,
}

//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 叙事生成错误
///
/// 覆盖外部生成服务调用和响应解析两个阶段的失败。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// 生成服务不可达或返回错误状态
    #[error("生成服务不可用: {0}")]
    Unavailable(String),

    /// 超过配置的等待时间
    #[error("生成服务超时: {0} 秒内未响应")]
    Timeout(u64),

    /// 无法从响应文本中恢复出故事记录
    #[error("生成结果格式错误: {reason}")]
    MalformedResponse {
        /// 失败原因
        reason: String,
        /// 原始响应文本（仅用于诊断）
        raw: String,
    },
}

impl GenerationError {
    /// 构造格式错误
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        GenerationError::MalformedResponse {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }

    /// 原始响应文本（仅格式错误时存在）
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            GenerationError::MalformedResponse { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }
}

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 角色不存在
    #[error("角色不存在: {0}")]
    CharacterNotFound(String),

    /// 游戏会话不存在
    #[error("游戏会话不存在: {0}")]
    SessionNotFound(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 故事生成失败
    #[error("故事生成失败: {0}")]
    GenerationFailed(#[from] GenerationError),

    /// 并发更新冲突
    #[error("更新冲突: {0}")]
    Conflict(String),

    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(feature = "surrealdb")]
impl From<surrealdb::Error> for AppError {
    fn from(e: surrealdb::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::CharacterNotFound(_) => (404, "CHARACTER_NOT_FOUND".to_string()),
            AppError::SessionNotFound(_) => (404, "SESSION_NOT_FOUND".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Conflict(_) => (409, "CONFLICT".to_string()),
            AppError::GenerationFailed(GenerationError::Timeout(_)) => {
                (504, "GENERATION_TIMEOUT".to_string())
            }
            AppError::GenerationFailed(_) => (502, "GENERATION_FAILED".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code) = (&AppError::SessionNotFound("s1".into())).into();
        assert_eq!(status, 404);
        assert_eq!(code, "SESSION_NOT_FOUND");

        let (status, _) = (&AppError::GenerationFailed(GenerationError::Timeout(30))).into();
        assert_eq!(status, 504);

        let err = AppError::from(GenerationError::malformed("no json", "just prose"));
        let (status, code) = (&err).into();
        assert_eq!(status, 502);
        assert_eq!(code, "GENERATION_FAILED");
    }

    #[test]
    fn test_malformed_keeps_raw_text() {
        let err = GenerationError::malformed("missing field", "{\"story_text\": 1}");
        assert_eq!(err.raw_text(), Some("{\"story_text\": 1}"));
        assert_eq!(GenerationError::Timeout(5).raw_text(), None);
    }

    #[test]
    fn test_error_response_serializes_code_and_message() {
        let resp = ErrorResponse::new("CONFLICT", "stale");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({"code": "CONFLICT", "message": "stale"}));
    }
}

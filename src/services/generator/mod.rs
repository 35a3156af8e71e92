//! 叙事生成客户端
//!
//! 封装与外部大模型服务的一次请求/响应交换。系统指令与模型在后端
//! 创建时固定，会话标识随每次调用传入。

mod gemini;
mod ollama;

pub use gemini::GeminiGenerator;
pub use ollama::OllamaGenerator;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::config::GeneratorConfig;
use crate::error::{AppError, GenerationError, Result};
use crate::services::prompts::DUNGEON_MASTER_INSTRUCTION;

/// 叙事生成 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// 发送提示词，返回原始响应文本
    ///
    /// 无法连接或服务返回错误时为 `Unavailable`，超过截止时间为 `Timeout`。
    async fn send(&self, conversation_id: &str, prompt: &str)
    -> std::result::Result<String, GenerationError>;
}

/// 生成服务上下文
///
/// 进程启动时创建一次，由各后端共享：HTTP 客户端、凭据、模型和系统指令。
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    client: reqwest::Client,
    config: GeneratorConfig,
    system_instruction: String,
}

impl GeneratorContext {
    /// 创建上下文，使用默认地下城主指令
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            system_instruction: DUNGEON_MASTER_INSTRUCTION.to_string(),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// 单次交换的截止时间
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 在截止时间内执行请求
    pub(crate) async fn within_deadline<F>(
        &self,
        exchange: F,
    ) -> std::result::Result<String, GenerationError>
    where
        F: Future<Output = std::result::Result<String, GenerationError>>,
    {
        let deadline = self.deadline();
        tokio::time::timeout(deadline, exchange)
            .await
            .map_err(|_| GenerationError::Timeout(deadline.as_secs()))?
    }
}

/// 将传输错误映射为不可用
pub(crate) fn transport_error(e: reqwest::Error) -> GenerationError {
    GenerationError::Unavailable(e.to_string())
}

/// 检查状态码，非 2xx 时带上响应体
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenerationError::Unavailable(format!(
        "generator returned {}: {}",
        status, body
    )))
}

/// 根据配置创建生成后端
pub fn create_narrative_generator(
    context: Arc<GeneratorContext>,
) -> Result<Box<dyn NarrativeGenerator>> {
    match context.config().backend.as_str() {
        "gemini" => Ok(Box::new(GeminiGenerator::new(context))),
        "ollama" => Ok(Box::new(OllamaGenerator::new(context))),
        other => Err(AppError::Config(format!(
            "unknown generator backend: {}",
            other
        ))),
    }
}

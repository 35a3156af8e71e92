use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 环境变量前缀
const ENV_PREFIX: &str = "DARKQUEST_";

/// Gemini 服务主机名
const GEMINI_HOST: &str = "generativelanguage.googleapis.com";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序（后者覆盖前者）：
    /// 1. 开发环境默认值
    /// 2. ./darkquest.toml
    /// 3. GEMINI_API_KEY
    /// 4. DARKQUEST_ 前缀的环境变量（`__` 分隔层级）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY"])
                    .map(|_| "generator.api_key".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.backend == "surrealdb" && config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if config.generator.backend == "gemini" && config.generator.api_key.is_empty() {
            return Err(ConfigValidationError::MissingApiKey);
        }

        if config.generator.backend == "ollama" {
            if config.generator.model.starts_with("gemini") {
                return Err(ConfigValidationError::BackendMismatch("model"));
            }
            if config.generator.base_url.contains(GEMINI_HOST) {
                return Err(ConfigValidationError::BackendMismatch("base_url"));
            }
        }

        if config.generator.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        if config.game.context_window == 0 {
            return Err(ConfigValidationError::InvalidContextWindow);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("数据库连接 URL 未配置")]
    MissingDatabaseUrl,

    #[error("Gemini API 密钥未配置（GEMINI_API_KEY 或 DARKQUEST_GENERATOR__API_KEY）")]
    MissingApiKey,

    #[error("ollama 后端仍在使用 Gemini 的 {0}，请同时配置 generator.model 和 generator.base_url")]
    BackendMismatch(&'static str),

    #[error("生成服务超时无效，必须大于 0")]
    InvalidTimeout,

    #[error("上下文窗口无效，必须大于 0")]
    InvalidContextWindow,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("darkquest.toml")
}

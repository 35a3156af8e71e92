use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 存储后端: "surrealdb" 或 "memory"
    pub backend: String,
    /// SurrealDB 连接地址（支持 ws://、http://、mem://）
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名（为空时跳过登录，适用于嵌入式引擎）
    pub username: String,
    /// 密码
    pub password: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 允许的跨域来源，空列表或 "*" 表示全部允许
    pub cors_origins: Vec<String>,
}

/// 叙事生成服务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 生成后端: "gemini" 或 "ollama"
    pub backend: String,
    /// API 密钥（Gemini 必填）
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 服务基础地址
    pub base_url: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 采样温度
    pub temperature: Option<f32>,
}

/// 游戏规则配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    /// 续写时回传给生成服务的最近故事段数
    pub context_window: usize,
    /// 玩家选择文本最大长度
    pub max_choice_length: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 生成服务配置
    pub generator: GeneratorConfig,
    /// 游戏规则配置
    pub game: GameConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8001,
                request_timeout: 90,
                cors_origins: vec!["*".into()],
            },
            database: DatabaseConfig {
                backend: "surrealdb".into(),
                url: "ws://localhost:8000".into(),
                namespace: "darkquest".into(),
                database: "game".into(),
                username: "root".into(),
                password: "root".into(),
            },
            generator: GeneratorConfig {
                backend: "gemini".into(),
                api_key: String::new(),
                model: "gemini-2.0-flash".into(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
                timeout_secs: 60,
                temperature: None,
            },
            game: GameConfig {
                context_window: 3,
                max_choice_length: 500,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            app_name: "darkquest".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config
    }

    /// 本地测试配置：内存存储，无需外部数据库
    pub fn in_memory() -> Self {
        let mut config = Self::development();
        config.database.backend = "memory".into();
        config.database.url = String::new();
        config
    }
}

use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use std::sync::Arc;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;

/// SurrealDB 连接句柄
///
/// 进程启动时打开，关闭后所有仓储调用返回数据库错误。
#[derive(Clone)]
pub struct SurrealPool {
    db: Arc<Mutex<Option<Surreal<Any>>>>,
}

impl SurrealPool {
    /// 打开连接
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let db: Surreal<Any> = connect(config.url.as_str()).await?;

        // 嵌入式引擎（mem://）无需认证
        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        // 选择命名空间和数据库
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
        })
    }

    /// 获取内部数据库实例
    pub async fn inner(&self) -> Result<Surreal<Any>> {
        let guard = self.db.lock().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::Database("database connection closed".into()))
    }

    /// 检查连接是否可用
    pub async fn health(&self) -> Result<()> {
        self.inner().await?.health().await?;
        Ok(())
    }

    /// 关闭连接
    pub async fn close(&self) {
        let mut guard = self.db.lock().await;
        *guard = None;
    }
}

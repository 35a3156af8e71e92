//! 存储工厂模块
//!
//! 根据配置创建相应的存储实例。

use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::storage::memory::InMemoryGameStateRepository;
use crate::storage::repository::GameStateRepository;
use std::sync::Arc;

#[cfg(feature = "surrealdb")]
use crate::storage::{repository::SurrealGameStateRepository, surrealdb::SurrealPool};

/// 存储实例枚举
pub enum StorageInstance {
    #[cfg(feature = "surrealdb")]
    SurrealDB(SurrealPool),
    Memory(Arc<InMemoryGameStateRepository>),
}

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建存储实例
    pub async fn create(config: &DatabaseConfig) -> Result<StorageInstance> {
        match config.backend.as_str() {
            "memory" => Ok(StorageInstance::Memory(Arc::new(
                InMemoryGameStateRepository::new(),
            ))),
            #[cfg(feature = "surrealdb")]
            "surrealdb" => {
                let pool = SurrealPool::new(config).await?;
                Ok(StorageInstance::SurrealDB(pool))
            }
            #[cfg(not(feature = "surrealdb"))]
            "surrealdb" => Err(AppError::Config(
                "SurrealDB feature is not enabled. Enable 'surrealdb' feature or use the memory backend."
                    .into(),
            )),
            other => Err(AppError::Config(format!(
                "unknown database backend: {}",
                other
            ))),
        }
    }
}

impl StorageInstance {
    /// 仓储句柄
    pub fn repository(&self) -> Arc<dyn GameStateRepository> {
        match self {
            #[cfg(feature = "surrealdb")]
            StorageInstance::SurrealDB(pool) => {
                Arc::new(SurrealGameStateRepository::new(pool.clone()))
            }
            StorageInstance::Memory(repo) => repo.clone(),
        }
    }

    /// 检查存储是否可用
    pub async fn health_check(&self) -> Result<()> {
        match self {
            #[cfg(feature = "surrealdb")]
            StorageInstance::SurrealDB(pool) => pool.health().await,
            StorageInstance::Memory(_) => Ok(()),
        }
    }

    /// 关闭连接
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "surrealdb")]
            StorageInstance::SurrealDB(pool) => pool.close().await,
            StorageInstance::Memory(_) => {}
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "surrealdb")]
            StorageInstance::SurrealDB(_) => "surrealdb",
            StorageInstance::Memory(_) => "memory",
        }
    }
}

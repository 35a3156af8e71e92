//! 存储层模块
//!
//! 提供游戏状态持久化，支持 SurrealDB 与进程内存储。

#[cfg(feature = "surrealdb")]
pub mod surrealdb;

pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{StorageFactory, StorageInstance};
pub use memory::InMemoryGameStateRepository;
pub use repository::GameStateRepository;

#[cfg(feature = "surrealdb")]
pub use repository::SurrealGameStateRepository;

//! Darkquest - 暗黑奇幻叙事游戏服务
//!
//! 由大模型扮演地下城主：玩家创建角色后开始会话，每次选择都会生成
//! 新的故事段落，会话历史完整保存并可随时回看。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;

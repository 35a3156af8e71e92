//! Routes 模块
//!
//! 定义 API 路由。

pub mod character_routes;
pub mod story_routes;

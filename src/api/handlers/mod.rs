//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod character_handler;
pub mod story_handler;

pub use character_handler::*;
pub use story_handler::*;

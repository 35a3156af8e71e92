//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod character_dto;
pub mod story_dto;

pub use character_dto::*;
pub use story_dto::*;

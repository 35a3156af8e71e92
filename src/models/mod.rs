//! 核心数据模型模块
//!
//! 定义 Darkquest 的核心数据结构：Character, GameSession, StoryRecord。

pub mod character;
pub mod session;
pub mod story;

pub use character::*;
pub use session::{GameSession, StoryHistory};
pub use story::StoryRecord;

use serde::{Deserialize, Serialize};

/// 故事记录
///
/// 生成服务每轮产出的结构化单元，产出后立即并入会话状态，不单独持久化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// 故事正文（3-5 句）
    pub story_text: String,
    /// 供玩家选择的行动（约定为 3 项）
    pub choices: Vec<String>,
    /// 当前地点
    pub location: String,
    /// 是否进入战斗
    pub combat_encounter: bool,
}

impl StoryRecord {
    pub fn new(
        story_text: impl Into<String>,
        choices: Vec<String>,
        location: impl Into<String>,
        combat_encounter: bool,
    ) -> Self {
        Self {
            story_text: story_text.into(),
            choices,
            location: location.into(),
            combat_encounter,
        }
    }
}

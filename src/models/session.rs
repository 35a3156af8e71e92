use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::story::StoryRecord;

/// 游戏会话
///
/// 叙事连续性的基本单位。`story_history` 与 `choices_made` 只追加，
/// 开始后始终满足 `story_history.len() == choices_made.len() + 1`，
/// 且 `current_story` 等于最后一段故事。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// 会话唯一标识（对外句柄）
    pub session_id: String,

    /// 生成服务会话标识（仅内部使用）
    pub conversation_id: String,

    /// 所属角色
    pub character_id: String,

    /// 当前地点
    pub current_location: String,

    /// 当前故事（等于 story_history 最后一项）
    pub current_story: String,

    /// 故事历史，下标即轮次
    pub story_history: Vec<String>,

    /// 玩家已做出的选择
    pub choices_made: Vec<String>,

    /// 乐观锁版本号，每次提交选择后递增
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    /// 以开场故事创建新会话
    pub fn start(character_id: &str, opening: &StoryRecord) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            conversation_id: Uuid::new_v4().to_string(),
            character_id: character_id.to_string(),
            current_location: opening.location.clone(),
            current_story: opening.story_text.clone(),
            story_history: vec![opening.story_text.clone()],
            choices_made: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 当前轮次（开场为 0）
    pub fn turn(&self) -> usize {
        self.choices_made.len()
    }

    /// 最近的至多 `window` 段故事，按时间先后排列
    pub fn recent_story(&self, window: usize) -> &[String] {
        let start = self.story_history.len().saturating_sub(window);
        &self.story_history[start..]
    }

    /// 返回并入一次选择后的新会话，自身不变
    pub fn advanced(&self, choice_text: &str, record: &StoryRecord) -> Self {
        let mut next = self.clone();
        next.story_history.push(record.story_text.clone());
        next.choices_made.push(choice_text.to_string());
        next.current_story = record.story_text.clone();
        next.current_location = record.location.clone();
        next.version = self.version + 1;
        next.updated_at = Utc::now();
        next
    }

    /// 检查历史不变量
    pub fn is_consistent(&self) -> bool {
        self.story_history.len() == self.choices_made.len() + 1
            && self.story_history.last() == Some(&self.current_story)
    }

    /// 只读历史视图
    pub fn history(&self) -> StoryHistory {
        StoryHistory {
            story_history: self.story_history.clone(),
            choices_made: self.choices_made.clone(),
            current_location: self.current_location.clone(),
        }
    }
}

/// 会话历史
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryHistory {
    pub story_history: Vec<String>,
    pub choices_made: Vec<String>,
    pub current_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, location: &str) -> StoryRecord {
        StoryRecord::new(
            text,
            vec!["a".into(), "b".into(), "c".into()],
            location,
            false,
        )
    }

    #[test]
    fn test_start_session() {
        let session = GameSession::start("char-1", &record("You wake.", "Crypt"));
        assert_eq!(session.story_history, vec!["You wake."]);
        assert!(session.choices_made.is_empty());
        assert_eq!(session.current_location, "Crypt");
        assert_eq!(session.version, 0);
        assert_ne!(session.session_id, session.conversation_id);
        assert!(session.is_consistent());
    }

    #[test]
    fn test_advanced_leaves_original_untouched() {
        let session = GameSession::start("char-1", &record("You wake.", "Crypt"));
        let next = session.advanced("Light a torch", &record("Shadows flee.", "Crypt Hall"));

        assert_eq!(session.story_history.len(), 1);
        assert_eq!(next.story_history, vec!["You wake.", "Shadows flee."]);
        assert_eq!(next.choices_made, vec!["Light a torch"]);
        assert_eq!(next.current_story, "Shadows flee.");
        assert_eq!(next.current_location, "Crypt Hall");
        assert_eq!(next.version, 1);
        assert_eq!(next.turn(), 1);
        assert!(next.is_consistent());
    }

    #[test]
    fn test_recent_story_window() {
        let mut session = GameSession::start("c", &record("s0", "l"));
        assert_eq!(session.recent_story(3), ["s0".to_string()]);

        for i in 1..5 {
            session = session.advanced(&format!("c{}", i), &record(&format!("s{}", i), "l"));
        }
        assert_eq!(session.recent_story(3), ["s2", "s3", "s4"]);
        assert_eq!(session.recent_story(0).len(), 0);
    }
}

//! 提示词
//!
//! 地下城主人设（系统指令）以及开场、续写两类用户提示词。

use crate::models::character::Character;
use crate::models::session::GameSession;

/// 地下城主系统指令，同时约定输出格式
pub const DUNGEON_MASTER_INSTRUCTION: &str = r#"You are a master Dungeon Master for a dark fantasy D&D campaign. Your role is to:

1. Create immersive, atmospheric dark fantasy stories with rich descriptions
2. Present exactly 3 meaningful choices after each story segment
3. Respond in this exact JSON format:
{
  "story_text": "Your atmospheric story description here...",
  "choices": ["Choice 1", "Choice 2", "Choice 3"],
  "location": "Current location name",
  "combat_encounter": false
}

IMPORTANT RULES:
- Keep stories between 3-5 sentences for good pacing
- Choices should be meaningful and lead to different outcomes
- Include dark fantasy elements: ancient evils, cursed artifacts, haunted places, moral dilemmas
- Make choices feel impactful - no meaningless options
- If combat occurs, set "combat_encounter": true
- Maintain continuity with previous story elements
- Each story segment should advance the narrative meaningfully

DARK FANTASY THEMES: corruption, ancient curses, moral ambiguity, supernatural horror, fallen kingdoms, necromancy, demonic influences, haunted locations, mysterious artifacts, tragic heroes."#;

/// 开场提示词
pub fn opening_prompt(character: &Character) -> String {
    format!(
        "Start a dark fantasy D&D adventure for {}.\n\n\
         Begin the adventure in an appropriately dark and mysterious setting. \
         Create an engaging opening scenario that sets the dark fantasy tone and \
         presents the character with their first meaningful choice.",
        character.summary()
    )
}

/// 续写提示词
///
/// 只回传最近 `context_window` 段故事；生成服务自身是否保留会话记忆
/// 不做假设，这里传入的上下文是唯一可信来源。
pub fn continuation_prompt(
    character: &Character,
    session: &GameSession,
    choice_text: &str,
    context_window: usize,
) -> String {
    let recent = session.recent_story(context_window).join("\n");
    format!(
        "Continue the dark fantasy adventure for {name}.\n\n\
         RECENT STORY CONTEXT:\n{recent}\n\n\
         CURRENT LOCATION: {location}\n\n\
         PLAYER'S CHOICE: {choice}\n\n\
         Based on this choice, continue the story with consequences and new developments. \
         Present 3 new meaningful choices that advance the narrative.",
        name = character.name,
        recent = recent,
        location = session.current_location,
        choice = choice_text,
    )
}

//! 服务模块

pub mod character;
pub mod generator;
pub mod prompts;
pub mod session;
pub mod story_parser;

pub use character::{CharacterService, NewCharacter, create_character_service};
pub use generator::{GeneratorContext, NarrativeGenerator, create_narrative_generator};
pub use session::{GameSessionService, SessionRules, create_game_session_service};
pub use story_parser::{ExtractionTier, LenientJsonParser, ResponseParser};

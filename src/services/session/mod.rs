//! 游戏会话服务
//!
//! 会话状态机：开始、提交选择、读取历史。每次变更都先完成生成和解析，
//! 再以版本号整体替换会话；任何一步失败都不写入存储。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, GenerationError, Result};
use crate::models::character::Character;
use crate::models::session::{GameSession, StoryHistory};
use crate::models::story::StoryRecord;
use crate::observability::AppMetrics;
use crate::security::validators;
use crate::services::generator::NarrativeGenerator;
use crate::services::prompts::{continuation_prompt, opening_prompt};
use crate::services::story_parser::ResponseParser;
use crate::storage::repository::GameStateRepository;

/// 会话服务 trait
#[async_trait]
pub trait GameSessionService: Send + Sync {
    /// 为角色开始新会话，返回会话 ID 和开场故事
    async fn start(&self, character_id: &str) -> Result<(String, StoryRecord)>;

    /// 提交玩家选择，返回新的故事段落
    async fn apply_choice(&self, session_id: &str, choice_text: &str) -> Result<StoryRecord>;

    /// 读取会话历史
    async fn get_history(&self, session_id: &str) -> Result<StoryHistory>;
}

/// 会话规则
#[derive(Debug, Clone, Copy)]
pub struct SessionRules {
    /// 续写时回传的最近故事段数
    pub context_window: usize,
    /// 选择文本最大长度
    pub max_choice_length: usize,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            context_window: 3,
            max_choice_length: 500,
        }
    }
}

/// 会话服务实现
pub struct GameSessionServiceImpl {
    repository: Arc<dyn GameStateRepository>,
    generator: Arc<dyn NarrativeGenerator>,
    parser: Arc<dyn ResponseParser>,
    rules: SessionRules,
    metrics: Arc<AppMetrics>,
}

impl GameSessionServiceImpl {
    /// 创建新的服务实例
    pub fn new(
        repository: Arc<dyn GameStateRepository>,
        generator: Arc<dyn NarrativeGenerator>,
        parser: Arc<dyn ResponseParser>,
        rules: SessionRules,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            repository,
            generator,
            parser,
            rules,
            metrics,
        }
    }

    async fn load_character(&self, character_id: &str) -> Result<Character> {
        self.repository
            .find_character(character_id)
            .await?
            .ok_or_else(|| {
                debug!(character_id, "character lookup missed");
                AppError::CharacterNotFound(character_id.to_string())
            })
    }

    async fn load_session(&self, session_id: &str) -> Result<GameSession> {
        self.repository
            .find_session(session_id)
            .await?
            .ok_or_else(|| {
                debug!(session_id, "session lookup missed");
                AppError::SessionNotFound(session_id.to_string())
            })
    }

    /// 一次生成交换：发送提示词并解析为故事记录
    async fn narrate(&self, conversation_id: &str, prompt: &str) -> Result<StoryRecord> {
        let started = Instant::now();
        let outcome = match self.generator.send(conversation_id, prompt).await {
            Ok(raw) => self.parser.extract(&raw),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    combat = record.combat_encounter,
                    choices = record.choices.len(),
                    "narration produced"
                );
                Ok(record)
            }
            Err(e) => {
                self.metrics.record_generation_failure();
                log_generation_failure(&e);
                Err(AppError::GenerationFailed(e))
            }
        }
    }

    fn validate_choice(&self, choice_text: &str) -> Result<()> {
        validators::validate_choice_text(choice_text, self.rules.max_choice_length)?;
        Ok(())
    }
}

fn log_generation_failure(error: &GenerationError) {
    match error {
        GenerationError::MalformedResponse { reason, raw } => {
            warn!(%reason, raw = %raw, "generator output could not be parsed")
        }
        other => warn!(error = %other, "generator exchange failed"),
    }
}

#[async_trait]
impl GameSessionService for GameSessionServiceImpl {
    #[instrument(skip(self))]
    async fn start(&self, character_id: &str) -> Result<(String, StoryRecord)> {
        let character = self.load_character(character_id).await?;

        // 会话标识与生成服务会话标识分别生成
        let conversation_id = uuid::Uuid::new_v4().to_string();
        let record = self
            .narrate(&conversation_id, &opening_prompt(&character))
            .await?;

        let mut session = GameSession::start(&character.id, &record);
        session.conversation_id = conversation_id;
        self.repository.insert_session(&session).await?;
        self.metrics.record_session_started();

        info!(
            session_id = %session.session_id,
            character_id,
            location = %session.current_location,
            "session started"
        );
        Ok((session.session_id, record))
    }

    #[instrument(skip(self, choice_text))]
    async fn apply_choice(&self, session_id: &str, choice_text: &str) -> Result<StoryRecord> {
        self.validate_choice(choice_text)?;

        let session = self.load_session(session_id).await?;
        let character = self.load_character(&session.character_id).await?;

        let prompt = continuation_prompt(
            &character,
            &session,
            choice_text,
            self.rules.context_window,
        );
        let record = self.narrate(&session.conversation_id, &prompt).await?;

        let next = session.advanced(choice_text, &record);
        self.repository
            .replace_session(session_id, &next, session.version)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    warn!(session_id, version = session.version, "concurrent choice lost the race");
                }
            })?;
        self.metrics.record_choice_applied();

        info!(
            session_id,
            turn = next.turn(),
            location = %next.current_location,
            combat = record.combat_encounter,
            "choice applied"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn get_history(&self, session_id: &str) -> Result<StoryHistory> {
        Ok(self.load_session(session_id).await?.history())
    }
}

/// 创建会话服务
pub fn create_game_session_service(
    repository: Arc<dyn GameStateRepository>,
    generator: Arc<dyn NarrativeGenerator>,
    parser: Arc<dyn ResponseParser>,
    rules: SessionRules,
    metrics: Arc<AppMetrics>,
) -> Box<dyn GameSessionService> {
    Box::new(GameSessionServiceImpl::new(
        repository, generator, parser, rules, metrics,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::character::{Background, CharacterClass, CharacterCreate, Race};
    use crate::services::generator::MockNarrativeGenerator;
    use crate::services::story_parser::LenientJsonParser;
    use crate::storage::memory::InMemoryGameStateRepository;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    fn story_json(text: &str, location: &str) -> String {
        serde_json::json!({
            "story_text": text,
            "choices": ["Advance", "Hide", "Flee"],
            "location": location,
            "combat_encounter": false
        })
        .to_string()
    }

    async fn seeded_repository() -> (Arc<InMemoryGameStateRepository>, Character) {
        let repo = Arc::new(InMemoryGameStateRepository::new());
        let character = Character::new(CharacterCreate {
            name: "Kael".into(),
            race: Race::Elf,
            character_class: CharacterClass::Wizard,
            background: Background::Sage,
        });
        repo.insert_character(&character).await.unwrap();
        (repo, character)
    }

    fn service(
        repo: Arc<InMemoryGameStateRepository>,
        generator: MockNarrativeGenerator,
    ) -> (GameSessionServiceImpl, Arc<AppMetrics>) {
        let metrics = Arc::new(AppMetrics::default());
        let service = GameSessionServiceImpl::new(
            repo,
            Arc::new(generator),
            Arc::new(LenientJsonParser::new()),
            SessionRules::default(),
            metrics.clone(),
        );
        (service, metrics)
    }

    #[tokio::test]
    async fn test_start_persists_opening() {
        let (repo, character) = seeded_repository().await;
        let mut generator = MockNarrativeGenerator::new();
        generator
            .expect_send()
            .withf(|_, prompt| prompt.contains("Kael, a Elf Wizard with a Sage background"))
            .times(1)
            .returning(|_, _| Ok(story_json("The crypt breathes.", "Crypt")));

        let (service, metrics) = service(repo.clone(), generator);
        let (session_id, record) = service.start(&character.id).await.unwrap();

        assert_eq!(record.location, "Crypt");
        let stored = repo.find_session(&session_id).await.unwrap().unwrap();
        assert_eq!(stored.story_history, vec!["The crypt breathes."]);
        assert!(stored.choices_made.is_empty());
        assert_ne!(stored.conversation_id, session_id);
        assert_eq!(metrics.sessions_started.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_start_unknown_character() {
        let (repo, _) = seeded_repository().await;
        let mut generator = MockNarrativeGenerator::new();
        generator.expect_send().never();

        let (service, _) = service(repo.clone(), generator);
        let result = service.start("missing").await;

        assert!(matches!(result, Err(AppError::CharacterNotFound(_))));
        assert_eq!(repo.session_count(), 0);
    }

    #[tokio::test]
    async fn test_start_generation_failure_creates_nothing() {
        let (repo, character) = seeded_repository().await;
        let mut generator = MockNarrativeGenerator::new();
        generator
            .expect_send()
            .returning(|_, _| Err(GenerationError::Timeout(60)));

        let (service, metrics) = service(repo.clone(), generator);
        let result = service.start(&character.id).await;

        assert!(matches!(
            result,
            Err(AppError::GenerationFailed(GenerationError::Timeout(60)))
        ));
        assert_eq!(repo.session_count(), 0);
        assert_eq!(metrics.generation_failures.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_apply_choice_reuses_conversation_id() {
        let (repo, character) = seeded_repository().await;
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let recorder = seen.clone();

        let mut generator = MockNarrativeGenerator::new();
        let mut turn = 0;
        generator.expect_send().times(2).returning(move |conversation_id, _| {
            recorder.lock().unwrap().push(conversation_id.to_string());
            turn += 1;
            Ok(story_json(&format!("Segment {}", turn), "Ossuary"))
        });

        let (service, _) = service(repo.clone(), generator);
        let (session_id, _) = service.start(&character.id).await.unwrap();
        service.apply_choice(&session_id, "Advance").await.unwrap();

        let ids = seen.lock().unwrap().clone();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[0], session_id);
    }

    #[tokio::test]
    async fn test_apply_choice_sends_recent_context() {
        let (repo, character) = seeded_repository().await;
        let mut session = GameSession::start(
            &character.id,
            &StoryRecord::new("s0", vec![], "Gate", false),
        );
        for i in 1..=4 {
            session = session.advanced(
                &format!("c{}", i),
                &StoryRecord::new(format!("s{}", i), vec![], "Gate", false),
            );
        }
        repo.insert_session(&session).await.unwrap();

        let mut generator = MockNarrativeGenerator::new();
        generator
            .expect_send()
            .withf(|_, prompt| {
                prompt.contains("s2\ns3\ns4")
                    && !prompt.contains("s1\n")
                    && prompt.contains("PLAYER'S CHOICE: Ring the bell")
                    && prompt.contains("CURRENT LOCATION: Gate")
            })
            .times(1)
            .returning(|_, _| Ok(story_json("s5", "Belfry")));

        let (service, _) = service(repo.clone(), generator);
        service
            .apply_choice(&session.session_id, "Ring the bell")
            .await
            .unwrap();

        let history = service.get_history(&session.session_id).await.unwrap();
        assert_eq!(history.story_history.len(), 6);
        assert_eq!(history.current_location, "Belfry");
    }

    #[tokio::test]
    async fn test_malformed_output_leaves_session_unchanged() {
        let (repo, character) = seeded_repository().await;
        let mut generator = MockNarrativeGenerator::new();
        let mut calls = 0;
        generator.expect_send().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(story_json("Rain on stone.", "Courtyard"))
            } else {
                Ok("The Dungeon Master is silent tonight.".to_string())
            }
        });

        let (service, _) = service(repo.clone(), generator);
        let (session_id, _) = service.start(&character.id).await.unwrap();
        let before = repo.find_session(&session_id).await.unwrap().unwrap();

        let result = service.apply_choice(&session_id, "Wait").await;
        match result {
            Err(AppError::GenerationFailed(GenerationError::MalformedResponse { raw, .. })) => {
                assert!(raw.contains("silent"))
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let after = repo.find_session(&session_id).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_apply_choice_validation() {
        let (repo, _) = seeded_repository().await;
        let mut generator = MockNarrativeGenerator::new();
        generator.expect_send().never();
        let (service, _) = service(repo, generator);

        assert!(matches!(
            service.apply_choice("any", "   ").await,
            Err(AppError::Validation(_))
        ));
        let long = "x".repeat(501);
        assert!(matches!(
            service.apply_choice("any", &long).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.apply_choice("missing", "Open the door").await,
            Err(AppError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_history_missing_session() {
        let (repo, _) = seeded_repository().await;
        let (service, _) = service(repo, MockNarrativeGenerator::new());
        assert!(matches!(
            service.get_history("nope").await,
            Err(AppError::SessionNotFound(_))
        ));
    }

    /// 在生成期间抢先提交另一选择的生成器
    struct RacingGenerator {
        repo: Arc<InMemoryGameStateRepository>,
        session_id: String,
    }

    #[async_trait]
    impl NarrativeGenerator for RacingGenerator {
        async fn send(
            &self,
            _conversation_id: &str,
            _prompt: &str,
        ) -> std::result::Result<String, GenerationError> {
            let current = self.repo.find_session(&self.session_id).await.unwrap().unwrap();
            let raced = current.advanced(
                "Other",
                &StoryRecord::new("Elsewhere.", vec![], "Hall", false),
            );
            self.repo
                .replace_session(&self.session_id, &raced, current.version)
                .await
                .unwrap();
            Ok(story_json("Torches gutter.", "Hall"))
        }
    }

    #[tokio::test]
    async fn test_concurrent_commit_surfaces_conflict() {
        let (repo, character) = seeded_repository().await;
        let session = GameSession::start(
            &character.id,
            &StoryRecord::new("Doors groan.", vec![], "Hall", false),
        );
        repo.insert_session(&session).await.unwrap();

        let service = GameSessionServiceImpl::new(
            repo.clone(),
            Arc::new(RacingGenerator {
                repo: repo.clone(),
                session_id: session.session_id.clone(),
            }),
            Arc::new(LenientJsonParser::new()),
            SessionRules::default(),
            Arc::new(AppMetrics::default()),
        );

        let result = service.apply_choice(&session.session_id, "Mine").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = repo.find_session(&session.session_id).await.unwrap().unwrap();
        assert!(stored.is_consistent());
        assert_eq!(stored.choices_made, vec!["Other"]);
    }
}

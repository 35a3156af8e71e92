//! 角色服务
//!
//! 校验创建请求、查表生成角色并持久化。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{AppError, Result};
use crate::models::character::{
    Background, Character, CharacterClass, CharacterCreate, CharacterOptions, Race,
};
use crate::observability::AppMetrics;
use crate::security::validation::{RequestValidator, validators};
use crate::storage::repository::GameStateRepository;

/// 未校验的角色创建请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCharacter {
    pub name: String,
    pub race: String,
    pub character_class: String,
    pub background: String,
}

impl NewCharacter {
    /// 校验名称与各选项，得到可直接建档的请求
    pub fn validate(&self) -> Result<CharacterCreate> {
        let validator = RequestValidator::new();
        Ok(CharacterCreate {
            name: validators::validate_character_name(&self.name)?,
            race: validator.validate_option::<Race>("race", &self.race)?,
            character_class: validator
                .validate_option::<CharacterClass>("character_class", &self.character_class)?,
            background: validator.validate_option::<Background>("background", &self.background)?,
        })
    }
}

/// 角色服务 trait
#[async_trait]
pub trait CharacterService: Send + Sync {
    /// 创建角色
    async fn create(&self, request: NewCharacter) -> Result<Character>;

    /// 根据 ID 获取角色
    async fn get(&self, id: &str) -> Result<Character>;

    /// 可选种族、职业和背景
    fn options(&self) -> CharacterOptions;
}

/// 角色服务实现
pub struct CharacterServiceImpl {
    repository: Arc<dyn GameStateRepository>,
    metrics: Arc<AppMetrics>,
}

impl CharacterServiceImpl {
    pub fn new(repository: Arc<dyn GameStateRepository>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            repository,
            metrics,
        }
    }
}

#[async_trait]
impl CharacterService for CharacterServiceImpl {
    #[instrument(skip(self, request), fields(race = %request.race, class = %request.character_class))]
    async fn create(&self, request: NewCharacter) -> Result<Character> {
        let character = Character::new(request.validate()?);
        self.repository.insert_character(&character).await?;
        self.metrics.record_character_created();

        info!(
            character_id = %character.id,
            hit_points = character.hit_points,
            armor_class = character.armor_class,
            "character created"
        );
        Ok(character)
    }

    async fn get(&self, id: &str) -> Result<Character> {
        self.repository.find_character(id).await?.ok_or_else(|| {
            debug!(character_id = id, "character lookup missed");
            AppError::CharacterNotFound(id.to_string())
        })
    }

    fn options(&self) -> CharacterOptions {
        CharacterOptions::all()
    }
}

/// 创建角色服务
pub fn create_character_service(
    repository: Arc<dyn GameStateRepository>,
    metrics: Arc<AppMetrics>,
) -> Box<dyn CharacterService> {
    Box::new(CharacterServiceImpl::new(repository, metrics))
}

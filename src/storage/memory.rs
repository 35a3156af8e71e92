//! 进程内存储
//!
//! 用于测试和无数据库的本地运行，进程退出即丢失。

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{AppError, Result};
use crate::models::character::Character;
use crate::models::session::GameSession;
use crate::storage::repository::GameStateRepository;

/// 基于 DashMap 的仓储实现
#[derive(Debug, Default)]
pub struct InMemoryGameStateRepository {
    characters: DashMap<String, Character>,
    sessions: DashMap<String, GameSession>,
}

impl InMemoryGameStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已保存的会话数
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl GameStateRepository for InMemoryGameStateRepository {
    async fn find_character(&self, id: &str) -> Result<Option<Character>> {
        Ok(self.characters.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert_character(&self, character: &Character) -> Result<()> {
        match self.characters.entry(character.id.clone()) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "character {} already exists",
                character.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(character.clone());
                Ok(())
            }
        }
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<GameSession>> {
        Ok(self.sessions.get(session_id).map(|entry| entry.value().clone()))
    }

    async fn insert_session(&self, session: &GameSession) -> Result<()> {
        match self.sessions.entry(session.session_id.clone()) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "session {} already exists",
                session.session_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn replace_session(
        &self,
        session_id: &str,
        session: &GameSession,
        expected_version: u64,
    ) -> Result<()> {
        // 持有分片写锁期间完成比较与替换
        let mut current = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "session {} is at version {}, expected {}",
                session_id, current.version, expected_version
            )));
        }

        *current = session.clone();
        Ok(())
    }
}

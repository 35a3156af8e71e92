use async_trait::async_trait;

use crate::error::Result;
use crate::models::character::Character;
use crate::models::session::GameSession;

/// 游戏状态仓储 trait
///
/// 所有记录按自身生成的标识存取。`replace_session` 必须是整文档原子替换，
/// 并以版本号做乐观并发控制：存储中的版本与 `expected_version` 不一致时
/// 返回 `Conflict`，记录不存在时返回 `SessionNotFound`。
#[async_trait]
pub trait GameStateRepository: Send + Sync {
    /// 根据 ID 获取角色
    async fn find_character(&self, id: &str) -> Result<Option<Character>>;

    /// 保存新角色
    async fn insert_character(&self, character: &Character) -> Result<()>;

    /// 根据会话 ID 获取游戏会话
    async fn find_session(&self, session_id: &str) -> Result<Option<GameSession>>;

    /// 保存新会话
    async fn insert_session(&self, session: &GameSession) -> Result<()>;

    /// 版本校验后整体替换会话
    async fn replace_session(
        &self,
        session_id: &str,
        session: &GameSession,
        expected_version: u64,
    ) -> Result<()>;
}

#[cfg(feature = "surrealdb")]
pub use surreal_impl::SurrealGameStateRepository;

#[cfg(feature = "surrealdb")]
mod surreal_impl {
    use super::*;
    use crate::error::AppError;
    use crate::storage::surrealdb::SurrealPool;
    use serde_json::Value;
    use tracing::debug;

    const CHARACTER_TABLE: &str = "character";
    const SESSION_TABLE: &str = "game_session";

    /// SurrealDB 仓储实现
    #[derive(Clone)]
    pub struct SurrealGameStateRepository {
        pool: SurrealPool,
    }

    impl SurrealGameStateRepository {
        pub fn new(pool: SurrealPool) -> Self {
            Self { pool }
        }

        /// 序列化为文档内容，记录 ID 由 type::thing 指定
        fn content<T: serde::Serialize>(entity: &T) -> Result<Value> {
            let mut content = serde_json::to_value(entity)?;
            if let Some(object) = content.as_object_mut() {
                object.remove("id");
            }
            Ok(content)
        }

        async fn create(&self, table: &'static str, id: &str, content: Value) -> Result<()> {
            let db = self.pool.inner().await?;
            db.query("CREATE type::thing($table, $id) CONTENT $content RETURN NONE")
                .bind(("table", table))
                .bind(("id", id.to_string()))
                .bind(("content", content))
                .await?
                .check()?;
            Ok(())
        }
    }

    #[async_trait]
    impl GameStateRepository for SurrealGameStateRepository {
        async fn find_character(&self, id: &str) -> Result<Option<Character>> {
            let db = self.pool.inner().await?;
            let rows: Vec<Value> = db
                .query("SELECT *, record::id(id) AS id FROM type::thing($table, $id)")
                .bind(("table", CHARACTER_TABLE))
                .bind(("id", id.to_string()))
                .await?
                .take(0)?;

            rows.into_iter()
                .next()
                .map(|row| serde_json::from_value(row).map_err(AppError::from))
                .transpose()
        }

        async fn insert_character(&self, character: &Character) -> Result<()> {
            self.create(CHARACTER_TABLE, &character.id, Self::content(character)?)
                .await
        }

        async fn find_session(&self, session_id: &str) -> Result<Option<GameSession>> {
            let db = self.pool.inner().await?;
            let rows: Vec<Value> = db
                .query("SELECT * OMIT id FROM type::thing($table, $id)")
                .bind(("table", SESSION_TABLE))
                .bind(("id", session_id.to_string()))
                .await?
                .take(0)?;

            rows.into_iter()
                .next()
                .map(|row| serde_json::from_value(row).map_err(AppError::from))
                .transpose()
        }

        async fn insert_session(&self, session: &GameSession) -> Result<()> {
            self.create(SESSION_TABLE, &session.session_id, Self::content(session)?)
                .await
        }

        async fn replace_session(
            &self,
            session_id: &str,
            session: &GameSession,
            expected_version: u64,
        ) -> Result<()> {
            let db = self.pool.inner().await?;
            // WHERE 在同一语句内校验版本，替换与校验不可分割
            let updated: Vec<Value> = db
                .query(
                    "UPDATE type::thing($table, $id) CONTENT $content \
                     WHERE version = $expected RETURN VALUE version",
                )
                .bind(("table", SESSION_TABLE))
                .bind(("id", session_id.to_string()))
                .bind(("content", Self::content(session)?))
                .bind(("expected", expected_version))
                .await?
                .take(0)?;

            if !updated.is_empty() {
                return Ok(());
            }

            debug!(session_id, expected_version, "versioned replace matched no record");
            match self.find_session(session_id).await? {
                None => Err(AppError::SessionNotFound(session_id.to_string())),
                Some(current) => Err(AppError::Conflict(format!(
                    "session {} is at version {}, expected {}",
                    session_id, current.version, expected_version
                ))),
            }
        }
    }

}

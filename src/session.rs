//! Game Sessions
//!
//! Per-user game state. `current_enemy` and `game_state` are reserved fields
//! carried for forward compatibility; the current mechanics never set them.

use std::sync::Arc;

use crate::db::Database;
use crate::error::BotError;
use crate::quest::Quest;

/// Session state placeholder. Only `Idle` exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Idle,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(GameState::Idle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub user_id: i64,
    /// Reserved, always `None` in current mechanics
    pub current_enemy: Option<String>,
    /// Reserved, always `Idle` in current mechanics
    pub game_state: GameState,
    /// Full quest snapshot, non-null only between issuance and resolution
    pub current_quest: Option<Quest>,
}

impl GameSession {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            current_enemy: None,
            game_state: GameState::Idle,
            current_quest: None,
        }
    }
}

/// Store for per-user game sessions, keyed by user id.
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Database>,
}

impl SessionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Read-only lookup, no creation.
    pub async fn get(&self, user_id: i64) -> Result<Option<GameSession>, BotError> {
        self.db.get_session(user_id).await
    }

    /// Idempotent: returns the existing session or creates an idle one.
    pub async fn get_or_create(&self, user_id: i64) -> Result<GameSession, BotError> {
        if let Some(session) = self.db.get_session(user_id).await? {
            return Ok(session);
        }
        let session = GameSession::new(user_id);
        self.db.upsert_session(&session).await?;
        Ok(session)
    }

    /// Toggle the quest snapshot and persist the session.
    pub async fn set_current_quest(
        &self,
        user_id: i64,
        quest: Option<Quest>,
    ) -> Result<(), BotError> {
        let mut session = self.get_or_create(user_id).await?;
        session.current_quest = quest;
        self.db.upsert_session(&session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::catalog::built_in_quests;

    async fn store() -> SessionStore {
        SessionStore::new(Arc::new(Database::new_in_memory().await))
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = store().await;
        let first = store.get_or_create(1).await.unwrap();
        let second = store.get_or_create(1).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.game_state, GameState::Idle);
        assert!(first.current_enemy.is_none());
        assert!(first.current_quest.is_none());
    }

    #[tokio::test]
    async fn test_quest_snapshot_toggles() {
        let store = store().await;
        let quest = built_in_quests().remove(0);

        store.set_current_quest(5, Some(quest.clone())).await.unwrap();
        let session = store.get_or_create(5).await.unwrap();
        assert_eq!(session.current_quest, Some(quest));

        store.set_current_quest(5, None).await.unwrap();
        let session = store.get_or_create(5).await.unwrap();
        assert!(session.current_quest.is_none());
    }

    #[test]
    fn test_game_state_string_round_trip() {
        assert_eq!(GameState::from_str(GameState::Idle.as_str()), Some(GameState::Idle));
        assert_eq!(GameState::from_str("combat"), None);
    }
}

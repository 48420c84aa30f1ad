//! Character Records
//!
//! One character per user, created lazily with default stats, never deleted.
//! Experience and level are part of the persisted shape but unused by the
//! current mechanics.

use std::sync::Arc;

use crate::db::Database;
use crate::error::BotError;
use crate::quest::QuestReward;

pub const DEFAULT_NAME: &str = "Héros Manga";
pub const DEFAULT_HEALTH: i64 = 100;
pub const DEFAULT_ATTACK: i64 = 10;
pub const DEFAULT_DEFENSE: i64 = 5;
pub const DEFAULT_MONEY: i64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub user_id: i64,
    pub name: String,
    pub health: i64,
    pub attack: i64,
    pub defense: i64,
    pub experience: i64,
    pub level: i64,
    pub money: i64,
    /// Artifact names, insertion order, duplicates allowed
    pub artifacts: Vec<String>,
    /// Technique names, insertion order, duplicates allowed
    pub techniques: Vec<String>,
    pub portrait: Option<Vec<u8>>,
}

impl Character {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            name: DEFAULT_NAME.to_string(),
            health: DEFAULT_HEALTH,
            attack: DEFAULT_ATTACK,
            defense: DEFAULT_DEFENSE,
            experience: 0,
            level: 1,
            money: DEFAULT_MONEY,
            artifacts: Vec::new(),
            techniques: Vec::new(),
            portrait: None,
        }
    }

    /// Apply reward components in money, artifact, technique order.
    /// Returns the granted components as display strings, same order.
    pub fn apply_reward(&mut self, reward: &QuestReward) -> Vec<String> {
        let mut granted = Vec::new();
        if let Some(money) = reward.money {
            self.money += money;
            granted.push(format!("{} pièces", money));
        }
        if let Some(ref artifact) = reward.artifact {
            self.artifacts.push(artifact.clone());
            granted.push(artifact.clone());
        }
        if let Some(ref technique) = reward.technique {
            self.techniques.push(technique.clone());
            granted.push(technique.clone());
        }
        granted
    }

    /// Character sheet shown by /status.
    pub fn status_text(&self) -> String {
        format!(
            "Statut de {}:\nSanté: {}\nAttaque: {}\nDéfense: {}\nExpérience: {}\nNiveau: {}\nArgent: {} pièces\nArtefacts: {}\nTechniques: {}",
            self.name,
            self.health,
            self.attack,
            self.defense,
            self.experience,
            self.level,
            self.money,
            if self.artifacts.is_empty() {
                "Aucun".to_string()
            } else {
                self.artifacts.join(", ")
            },
            if self.techniques.is_empty() {
                "Aucune".to_string()
            } else {
                self.techniques.join(", ")
            },
        )
    }
}

/// Store for per-user character records, keyed by user id.
#[derive(Clone)]
pub struct CharacterStore {
    db: Arc<Database>,
}

impl CharacterStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Idempotent: returns the existing record or creates the default one.
    pub async fn get_or_create(&self, user_id: i64) -> Result<Character, BotError> {
        if let Some(character) = self.db.get_character(user_id).await? {
            return Ok(character);
        }
        let character = Character::new(user_id);
        self.db.upsert_character(&character).await?;
        tracing::info!("Created character for user {}", user_id);
        Ok(character)
    }

    /// Apply a quest reward and persist the mutated record.
    pub async fn apply_rewards(
        &self,
        user_id: i64,
        reward: &QuestReward,
    ) -> Result<(Character, Vec<String>), BotError> {
        let mut character = self.get_or_create(user_id).await?;
        let granted = character.apply_reward(reward);
        self.db.upsert_character(&character).await?;
        Ok((character, granted))
    }

    /// Replace the user's portrait and persist.
    pub async fn set_portrait(&self, user_id: i64, bytes: Vec<u8>) -> Result<(), BotError> {
        let mut character = self.get_or_create(user_id).await?;
        character.portrait = Some(bytes);
        self.db.upsert_character(&character).await?;
        Ok(())
    }
}

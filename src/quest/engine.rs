//! Quest Lifecycle Engine
//!
//! Drives the quest state machine for a single user: issuance, the
//! accept/refuse decision, probabilistic resolution and reward application.
//! Invariant: at most one active quest per user. All read-modify-write
//! sequences are serialized per user id.

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::catalog::QuestCatalog;
use super::definition::Quest;
use crate::character::CharacterStore;
use crate::error::BotError;
use crate::protocol::{ACTION_ACCEPT_QUEST, ACTION_REFUSE_QUEST};
use crate::session::SessionStore;

/// Probability that an accepted quest succeeds.
pub const QUEST_SUCCESS_PROBABILITY: f64 = 0.7;

/// Injectable uniform random source, so tests can force outcomes.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in [0, 1).
    fn roll(&self) -> f64;
}

/// Production source backed by the thread-local RNG.
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn roll(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// The user's decision on a pending quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestChoice {
    Accept,
    Refuse,
}

impl QuestChoice {
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            ACTION_ACCEPT_QUEST => Some(QuestChoice::Accept),
            ACTION_REFUSE_QUEST => Some(QuestChoice::Refuse),
            _ => None,
        }
    }
}

/// Result of a decision on a pending quest.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestOutcome {
    /// Bernoulli trial succeeded; rewards granted in money, artifact,
    /// technique order.
    Succeeded { quest: Quest, granted: Vec<String> },
    /// Trial failed, no character mutation
    Failed { quest: Quest },
    /// User refused, no character mutation
    Refused { quest: Quest },
}

pub struct QuestEngine {
    catalog: Arc<QuestCatalog>,
    characters: CharacterStore,
    sessions: SessionStore,
    random: Arc<dyn RandomSource>,
    /// Per-user serialization of issue/decide
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl QuestEngine {
    pub fn new(
        catalog: Arc<QuestCatalog>,
        characters: CharacterStore,
        sessions: SessionStore,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            catalog,
            characters,
            sessions,
            random,
            locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Issue a new quest: sample the catalog and snapshot the definition into
    /// the user's session. Fails with `QuestAlreadyActive` if one is pending.
    pub async fn issue(&self, user_id: i64) -> Result<Quest, BotError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let session = self.sessions.get_or_create(user_id).await?;
        if session.current_quest.is_some() {
            return Err(BotError::QuestAlreadyActive(user_id));
        }

        let quest = self
            .catalog
            .sample()
            .await
            .ok_or_else(|| BotError::Other("quest catalog is empty".to_string()))?;

        self.sessions
            .set_current_quest(user_id, Some(quest.clone()))
            .await?;

        info!("Issued quest '{}' to user {}", quest.name, user_id);
        Ok(quest)
    }

    /// Resolve the pending quest. Fails with `NoActiveQuest` when nothing is
    /// pending (stale affordance), without touching any store.
    ///
    /// On an accepted success, the character update is persisted before the
    /// session is cleared: a failure in between leaves the quest pending so
    /// the user can retry, instead of silently losing the reward.
    pub async fn decide(&self, user_id: i64, choice: QuestChoice) -> Result<QuestOutcome, BotError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        // Read-only lookup: a stale decision must not create any record.
        let quest = self
            .sessions
            .get(user_id)
            .await?
            .and_then(|session| session.current_quest)
            .ok_or(BotError::NoActiveQuest(user_id))?;

        match choice {
            QuestChoice::Refuse => {
                self.sessions.set_current_quest(user_id, None).await?;
                info!("User {} refused quest '{}'", user_id, quest.name);
                Ok(QuestOutcome::Refused { quest })
            }
            QuestChoice::Accept => {
                let roll = self.random.roll();
                let success = roll < QUEST_SUCCESS_PROBABILITY;
                debug!(
                    "User {} accepted quest '{}': roll {:.3} -> {}",
                    user_id,
                    quest.name,
                    roll,
                    if success { "success" } else { "failure" }
                );

                if success {
                    let (_, granted) = self
                        .characters
                        .apply_rewards(user_id, &quest.reward)
                        .await?;
                    self.sessions.set_current_quest(user_id, None).await?;
                    info!(
                        "User {} completed quest '{}', granted: {}",
                        user_id,
                        quest.name,
                        granted.join(", ")
                    );
                    Ok(QuestOutcome::Succeeded { quest, granted })
                } else {
                    self.sessions.set_current_quest(user_id, None).await?;
                    Ok(QuestOutcome::Failed { quest })
                }
            }
        }
    }
}

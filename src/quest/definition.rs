//! Quest Definition Structures
//!
//! Catalog entries are immutable; a copy of the definition is embedded in the
//! session at issuance time, so catalog edits never affect an in-flight quest.

use serde::{Deserialize, Serialize};

/// A quest file as it appears on disk
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    #[serde(default)]
    pub reward: RawReward,
}

/// Raw reward as it appears in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReward {
    pub money: Option<i64>,
    pub artifact: Option<String>,
    pub technique: Option<String>,
}

// ============================================================================
// Resolved Quest Structures (after parsing)
// ============================================================================

/// Difficulty tiers, a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "facile" => Some(Difficulty::Easy),
            "medium" | "moyen" => Some(Difficulty::Medium),
            "hard" | "difficile" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Display label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Facile",
            Difficulty::Medium => "Moyen",
            Difficulty::Hard => "Difficile",
        }
    }
}

/// Quest reward: optional components, at least one present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestReward {
    pub money: Option<i64>,
    pub artifact: Option<String>,
    pub technique: Option<String>,
}

impl QuestReward {
    pub fn is_empty(&self) -> bool {
        self.money.is_none() && self.artifact.is_none() && self.technique.is_none()
    }

    /// Human-readable reward components, always in money, artifact,
    /// technique order.
    pub fn describe(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(money) = self.money {
            parts.push(format!("{} pièces", money));
        }
        if let Some(ref artifact) = self.artifact {
            parts.push(artifact.clone());
        }
        if let Some(ref technique) = self.technique {
            parts.push(technique.clone());
        }
        parts
    }
}

/// A fully resolved quest definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub reward: QuestReward,
}

impl Quest {
    /// Create a Quest from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        let difficulty = Difficulty::from_str(&raw.difficulty)
            .ok_or_else(|| format!("Quest '{}' has invalid difficulty '{}'", raw.id, raw.difficulty))?;

        let reward = QuestReward {
            money: raw.reward.money,
            artifact: raw.reward.artifact.clone(),
            technique: raw.reward.technique.clone(),
        };
        if reward.is_empty() {
            return Err(format!("Quest '{}' has no reward components", raw.id));
        }
        if let Some(money) = reward.money {
            if money < 0 {
                return Err(format!("Quest '{}' has negative money reward", raw.id));
            }
        }

        Ok(Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            difficulty,
            reward,
        })
    }

    /// Text presented to the user when the quest is offered.
    pub fn offer_text(&self) -> String {
        format!(
            "Nouvelle quête disponible: {}\nDescription: {}\nDifficulté: {}\nRécompense: {}\nVoulez-vous accepter cette quête?",
            self.name,
            self.description,
            self.difficulty.label(),
            self.reward.describe().join(", ")
        )
    }
}

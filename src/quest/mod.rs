//! Quest System Module
//!
//! TOML-defined quest catalog plus the lifecycle engine: issuance,
//! accept/refuse decision, probabilistic resolution, reward application.

pub mod catalog;
pub mod definition;
pub mod engine;

pub use catalog::{HotReloadEvent, QuestCatalog};
pub use definition::{Difficulty, Quest, QuestReward};
pub use engine::{
    QUEST_SUCCESS_PROBABILITY, QuestChoice, QuestEngine, QuestOutcome, RandomSource,
    ThreadRngSource,
};

//! Manga Trivia
//!
//! Canned recommendations and facts. Ships with built-in lists; a
//! `trivia.toml` in the data directory replaces them.

use std::path::Path;

use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
struct RawTriviaFile {
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    facts: Vec<String>,
}

pub struct TriviaRegistry {
    recommendations: Vec<String>,
    facts: Vec<String>,
}

impl TriviaRegistry {
    pub fn new() -> Self {
        Self {
            recommendations: default_recommendations(),
            facts: default_facts(),
        }
    }

    /// Load `trivia.toml` from the data directory; non-empty lists replace
    /// the built-ins. A missing file keeps the defaults.
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), String> {
        let path = data_dir.join("trivia.toml");
        if !path.exists() {
            warn!("Trivia file does not exist: {:?}", path);
            return Ok(());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        let raw: RawTriviaFile =
            toml::from_str(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;

        if !raw.recommendations.is_empty() {
            self.recommendations = raw.recommendations;
        }
        if !raw.facts.is_empty() {
            self.facts = raw.facts;
        }

        info!(
            "Loaded trivia: {} recommendations, {} facts",
            self.recommendations.len(),
            self.facts.len()
        );
        Ok(())
    }

    pub fn pick_recommendation(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.recommendations.len());
        &self.recommendations[idx]
    }

    pub fn pick_fact(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.facts.len());
        &self.facts[idx]
    }
}

impl Default for TriviaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_recommendations() -> Vec<String> {
    [
        "One Piece",
        "Naruto",
        "Attack on Titan",
        "Death Note",
        "My Hero Academia",
        "Fullmetal Alchemist",
        "Dragon Ball",
        "Tokyo Ghoul",
        "Demon Slayer",
        "Hunter x Hunter",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_facts() -> Vec<String> {
    [
        "Le manga le plus vendu de tous les temps est One Piece.",
        "Osamu Tezuka, créateur d'Astro Boy, est souvent appelé le 'Dieu du manga'.",
        "Le terme 'manga' a été inventé par le célèbre artiste Hokusai au 19ème siècle.",
        "Les mangas se lisent généralement de droite à gauche.",
        "Le plus long manga jamais publié est JoJo's Bizarre Adventure, avec plus de 130 volumes.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

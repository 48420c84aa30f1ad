//! Quest Catalog
//!
//! Holds the pool of quest definitions the engine samples from. Ships with a
//! built-in set; TOML files in the data directory overlay it by quest id.
//! Supports hot-reloading during development.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::definition::{Difficulty, Quest, QuestReward, RawQuestFile};

/// Catalog of quest definitions, uniform-sampled with replacement.
pub struct QuestCatalog {
    quests: RwLock<Vec<Arc<Quest>>>,
    data_dir: PathBuf,
}

impl QuestCatalog {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            quests: RwLock::new(built_in_quests().into_iter().map(Arc::new).collect()),
            data_dir: data_dir.join("quests"),
        }
    }

    /// Catalog with a fixed quest list, no data directory. Useful for tests
    /// that need a deterministic draw.
    pub fn with_quests(quests: Vec<Quest>) -> Self {
        Self {
            quests: RwLock::new(quests.into_iter().map(Arc::new).collect()),
            data_dir: PathBuf::new(),
        }
    }

    /// Load quest files from the data directory, overlaying the built-in set
    /// by quest id. A missing directory leaves the built-ins untouched.
    pub async fn load_all(&self) -> Result<(), String> {
        if !self.data_dir.exists() {
            warn!("Quest directory does not exist: {:?}", self.data_dir);
            return Ok(());
        }

        let mut by_id: HashMap<String, Quest> = built_in_quests()
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        let entries = std::fs::read_dir(&self.data_dir)
            .map_err(|e| format!("Failed to read quest directory {:?}: {}", self.data_dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| format!("Failed to read entry: {}", e))?;
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "toml") {
                continue;
            }

            match load_quest_file(&path) {
                Ok(quest) => {
                    info!("Loaded quest: {} ({})", quest.name, quest.id);
                    by_id.insert(quest.id.clone(), quest);
                }
                Err(e) => warn!("Failed to load quest {:?}: {}", path, e),
            }
        }

        let mut list: Vec<Arc<Quest>> = by_id.into_values().map(Arc::new).collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));

        info!("Quest catalog holds {} definitions", list.len());
        *self.quests.write().await = list;
        Ok(())
    }

    /// Uniform-random draw with replacement across the whole catalog.
    /// Side-effect-free; returns `None` only for an empty catalog.
    pub async fn sample(&self) -> Option<Quest> {
        let quests = self.quests.read().await;
        if quests.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..quests.len());
        Some(quests[idx].as_ref().clone())
    }

    pub async fn count(&self) -> usize {
        self.quests.read().await.len()
    }

    pub async fn get(&self, quest_id: &str) -> Option<Arc<Quest>> {
        let quests = self.quests.read().await;
        quests.iter().find(|q| q.id == quest_id).cloned()
    }

    /// Start a file watcher that reloads the catalog when a quest file
    /// changes. Returns a receiver signalling reload outcomes.
    pub fn start_file_watcher(
        self: &Arc<Self>,
    ) -> Result<tokio::sync::mpsc::Receiver<HotReloadEvent>, String> {
        use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
        use std::time::Duration;

        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let catalog = Arc::clone(self);
        let data_dir = self.data_dir.clone();
        let rt = tokio::runtime::Handle::current();

        std::thread::spawn(move || {
            let (notify_tx, notify_rx) = std::sync::mpsc::channel();

            let mut watcher = match RecommendedWatcher::new(
                move |res: Result<notify::Event, notify::Error>| {
                    if let Ok(event) = res {
                        let _ = notify_tx.send(event);
                    }
                },
                Config::default().with_poll_interval(Duration::from_secs(1)),
            ) {
                Ok(w) => w,
                Err(e) => {
                    error!("Failed to create quest file watcher: {}", e);
                    return;
                }
            };

            if data_dir.exists() {
                if let Err(e) = watcher.watch(&data_dir, RecursiveMode::Recursive) {
                    error!("Failed to watch quest directory: {}", e);
                    return;
                }
            }

            info!("Quest hot-reload watcher started for {:?}", data_dir);

            while let Ok(event) = notify_rx.recv() {
                use notify::EventKind;
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    continue;
                }
                for path in &event.paths {
                    if path.extension().map_or(false, |ext| ext == "toml") {
                        info!("Detected change in {:?}, reloading catalog", path);
                        let catalog = Arc::clone(&catalog);
                        let tx = tx.clone();
                        let changed = path.to_string_lossy().to_string();
                        rt.spawn(async move {
                            match catalog.load_all().await {
                                Ok(()) => {
                                    let _ = tx.send(HotReloadEvent::Reloaded(changed)).await;
                                }
                                Err(e) => {
                                    error!("Quest hot-reload failed: {}", e);
                                    let _ = tx.send(HotReloadEvent::Error(e)).await;
                                }
                            }
                        });
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn load_quest_file(path: &Path) -> Result<Quest, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    let raw: RawQuestFile =
        toml::from_str(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;
    Quest::from_raw(&raw.quest)
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    Reloaded(String),
    Error(String),
}

/// The fixed quest pool observed in production: one quest per difficulty
/// tier, each with a distinct reward shape.
pub fn built_in_quests() -> Vec<Quest> {
    vec![
        Quest {
            id: "chasse_aux_tresors".to_string(),
            name: "Chasse aux trésors".to_string(),
            description: "Trouvez le trésor caché dans la forêt mystique.".to_string(),
            difficulty: Difficulty::Easy,
            reward: QuestReward {
                money: Some(100),
                artifact: Some("Amulette de force".to_string()),
                technique: None,
            },
        },
        Quest {
            id: "defense_du_village".to_string(),
            name: "Défense du village".to_string(),
            description: "Protégez le village contre une horde de bandits.".to_string(),
            difficulty: Difficulty::Medium,
            reward: QuestReward {
                money: Some(200),
                artifact: None,
                technique: Some("Coup de poing dévastateur".to_string()),
            },
        },
        Quest {
            id: "dragon_ancestral".to_string(),
            name: "Le dragon ancestral".to_string(),
            description: "Affrontez le dragon ancestral dans son antre.".to_string(),
            difficulty: Difficulty::Hard,
            reward: QuestReward {
                money: Some(500),
                artifact: Some("Épée légendaire".to_string()),
                technique: Some("Souffle du dragon".to_string()),
            },
        },
    ]
}

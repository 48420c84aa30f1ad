//! Bot Configuration
//!
//! Loaded from a TOML file with environment overrides. The allowed-group and
//! owner lists also act as the access policy for handlers.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Address the webhook server binds to
    pub bind_addr: String,
    /// SQLite connection string
    pub database_url: String,
    /// Directory holding quest and trivia TOML files
    pub data_dir: PathBuf,
    /// Group chats the bot answers in
    pub allowed_group_ids: Vec<i64>,
    /// Users allowed to upload reference images
    pub owner_ids: Vec<i64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: "sqlite:mangabot.db?mode=rwc".to_string(),
            data_dir: PathBuf::from("data"),
            allowed_group_ids: Vec::new(),
            owner_ids: Vec::new(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    /// A missing file is not an error; defaults are used.
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
            let config: BotConfig = toml::from_str(&content)
                .map_err(|e| format!("Failed to parse {:?}: {}", path, e))?;
            info!("Loaded configuration from {:?}", path);
            config
        } else {
            warn!("Config file {:?} not found, using defaults", path);
            BotConfig::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Environment overrides, mirroring the deployment surface:
    /// `BIND_ADDR`, `DATABASE_URL`, `ALLOWED_GROUP_IDS`, `OWNER_IDS`.
    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(ids) = std::env::var("ALLOWED_GROUP_IDS") {
            self.allowed_group_ids = parse_id_list(&ids);
        }
        if let Ok(ids) = std::env::var("OWNER_IDS") {
            self.owner_ids = parse_id_list(&ids);
        }
    }

    // ------------------------------------------------------------------------
    // Access policy
    // ------------------------------------------------------------------------

    pub fn is_allowed_chat(&self, chat_id: i64) -> bool {
        self.allowed_group_ids.contains(&chat_id)
    }

    pub fn is_privileged_user(&self, user_id: i64) -> bool {
        self.owner_ids.contains(&user_id)
    }
}

/// Parse a comma-separated id list, skipping entries that do not parse.
fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("Ignoring invalid id '{}' in list", trimmed);
                    None
                }
            }
        })
        .collect()
}

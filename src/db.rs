//! Persistence Layer
//!
//! Three independent keyed stores over SQLite: characters, sessions, and
//! reference images. Nested data (inventories, quest snapshots) is stored as
//! JSON columns; images get opaque UUID keys.

use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::character::Character;
use crate::error::BotError;
use crate::quest::Quest;
use crate::session::{GameSession, GameState};

pub struct Database {
    pool: SqlitePool,
    /// Countdown to an injected write failure, disabled when negative
    #[cfg(test)]
    write_failure_countdown: std::sync::atomic::AtomicI64,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, BotError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::migrate(&pool).await?;

        Ok(Self {
            pool,
            #[cfg(test)]
            write_failure_countdown: std::sync::atomic::AtomicI64::new(i64::MIN),
        })
    }

    /// Single-connection in-memory database for tests.
    #[cfg(test)]
    pub async fn new_in_memory() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        Self::migrate(&pool).await.expect("migrations");
        Self {
            pool,
            write_failure_countdown: std::sync::atomic::AtomicI64::new(i64::MIN),
        }
    }

    /// Make the write after `successful_writes` further writes fail, for
    /// exercising partial-failure recovery paths.
    #[cfg(test)]
    pub fn fail_write_after(&self, successful_writes: i64) {
        self.write_failure_countdown
            .store(successful_writes, std::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(test)]
    fn injected_write_failure(&self) -> Result<(), sqlx::Error> {
        let prev = self
            .write_failure_countdown
            .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        if prev == 0 {
            return Err(sqlx::Error::PoolClosed);
        }
        Ok(())
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS characters (
                user_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                health INTEGER NOT NULL DEFAULT 100,
                attack INTEGER NOT NULL DEFAULT 10,
                defense INTEGER NOT NULL DEFAULT 5,
                experience INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                money INTEGER NOT NULL DEFAULT 100,
                artifacts_json TEXT NOT NULL DEFAULT '[]',
                techniques_json TEXT NOT NULL DEFAULT '[]',
                portrait BLOB,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                user_id INTEGER PRIMARY KEY,
                current_enemy TEXT,
                game_state TEXT NOT NULL DEFAULT 'idle',
                current_quest_json TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS character_images (
                id TEXT PRIMARY KEY,
                image BLOB NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Name-keyed association between a character and a reference image
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS character_image_links (
                character_name TEXT PRIMARY KEY,
                image_id TEXT NOT NULL,
                FOREIGN KEY(image_id) REFERENCES character_images(id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Characters
    // ------------------------------------------------------------------------

    pub async fn get_character(&self, user_id: i64) -> Result<Option<Character>, BotError> {
        let row = sqlx::query(
            r#"SELECT user_id, name, health, attack, defense, experience, level, money,
                      artifacts_json, techniques_json, portrait
               FROM characters WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let artifacts: Vec<String> = serde_json::from_str(r.get("artifacts_json"))?;
            let techniques: Vec<String> = serde_json::from_str(r.get("techniques_json"))?;
            Ok(Character {
                user_id: r.get("user_id"),
                name: r.get("name"),
                health: r.get("health"),
                attack: r.get("attack"),
                defense: r.get("defense"),
                experience: r.get("experience"),
                level: r.get("level"),
                money: r.get("money"),
                artifacts,
                techniques,
                portrait: r.get("portrait"),
            })
        })
        .transpose()
    }

    pub async fn upsert_character(&self, character: &Character) -> Result<(), BotError> {
        #[cfg(test)]
        self.injected_write_failure()?;

        let artifacts_json = serde_json::to_string(&character.artifacts)?;
        let techniques_json = serde_json::to_string(&character.techniques)?;

        sqlx::query(
            r#"INSERT INTO characters
                   (user_id, name, health, attack, defense, experience, level, money,
                    artifacts_json, techniques_json, portrait)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   name = excluded.name,
                   health = excluded.health,
                   attack = excluded.attack,
                   defense = excluded.defense,
                   experience = excluded.experience,
                   level = excluded.level,
                   money = excluded.money,
                   artifacts_json = excluded.artifacts_json,
                   techniques_json = excluded.techniques_json,
                   portrait = excluded.portrait"#,
        )
        .bind(character.user_id)
        .bind(&character.name)
        .bind(character.health)
        .bind(character.attack)
        .bind(character.defense)
        .bind(character.experience)
        .bind(character.level)
        .bind(character.money)
        .bind(artifacts_json)
        .bind(techniques_json)
        .bind(&character.portrait)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    pub async fn get_session(&self, user_id: i64) -> Result<Option<GameSession>, BotError> {
        let row = sqlx::query(
            "SELECT user_id, current_enemy, game_state, current_quest_json FROM sessions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let current_quest: Option<Quest> = r
                .get::<Option<String>, _>("current_quest_json")
                .map(|json| serde_json::from_str(&json))
                .transpose()?;
            let game_state = GameState::from_str(r.get("game_state")).unwrap_or(GameState::Idle);
            Ok(GameSession {
                user_id: r.get("user_id"),
                current_enemy: r.get("current_enemy"),
                game_state,
                current_quest,
            })
        })
        .transpose()
    }

    pub async fn upsert_session(&self, session: &GameSession) -> Result<(), BotError> {
        #[cfg(test)]
        self.injected_write_failure()?;

        let current_quest_json = session
            .current_quest
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO sessions (user_id, current_enemy, game_state, current_quest_json, updated_at)
               VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
               ON CONFLICT(user_id) DO UPDATE SET
                   current_enemy = excluded.current_enemy,
                   game_state = excluded.game_state,
                   current_quest_json = excluded.current_quest_json,
                   updated_at = CURRENT_TIMESTAMP"#,
        )
        .bind(session.user_id)
        .bind(&session.current_enemy)
        .bind(session.game_state.as_str())
        .bind(current_quest_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reference images
    // ------------------------------------------------------------------------

    /// Insert an image and return its opaque id.
    pub async fn insert_image(&self, bytes: &[u8]) -> Result<String, BotError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO character_images (id, image) VALUES (?, ?)")
            .bind(&id)
            .bind(bytes)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Link an image to a character by (lowercased) name, replacing any
    /// previous link.
    pub async fn link_image(&self, character_name: &str, image_id: &str) -> Result<(), BotError> {
        sqlx::query(
            r#"INSERT INTO character_image_links (character_name, image_id)
               VALUES (?, ?)
               ON CONFLICT(character_name) DO UPDATE SET image_id = excluded.image_id"#,
        )
        .bind(character_name.to_lowercase())
        .bind(image_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_image_for_name(&self, character_name: &str) -> Result<Option<Vec<u8>>, BotError> {
        let row = sqlx::query(
            r#"SELECT i.image FROM character_images i
               JOIN character_image_links l ON l.image_id = i.id
               WHERE l.character_name = ?"#,
        )
        .bind(character_name.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("image")))
    }
}

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

mod character;
mod config;
mod db;
mod error;
mod gateway;
mod protocol;
mod quest;
mod router;
mod session;
mod trivia;

use config::BotConfig;
use db::Database;
use gateway::Outbox;
use protocol::IncomingUpdate;
use quest::{QuestCatalog, ThreadRngSource};
use router::BotContext;
use trivia::TriviaRegistry;

// ============================================================================
// App State
// ============================================================================

#[derive(Clone)]
struct AppState {
    ctx: Arc<BotContext>,
    config: Arc<BotConfig>,
}

impl AppState {
    async fn new() -> Self {
        // Load configuration (TOML file + environment overrides)
        let config = Arc::new(
            BotConfig::load(Path::new("bot.toml")).expect("Failed to load configuration"),
        );
        if config.allowed_group_ids.is_empty() {
            warn!("No allowed group ids configured; all chats will be rejected");
        }

        // Initialize database
        let db = Arc::new(
            Database::new(&config.database_url)
                .await
                .expect("Failed to initialize database"),
        );

        // Load quest catalog from TOML files
        let catalog = Arc::new(QuestCatalog::new(&config.data_dir));
        if let Err(e) = catalog.load_all().await {
            error!("Failed to load quest catalog: {}", e);
        }

        // Load trivia lists from TOML files
        let mut trivia = TriviaRegistry::new();
        if let Err(e) = trivia.load_from_directory(&config.data_dir) {
            error!("Failed to load trivia: {}", e);
        }

        // Start hot-reload watcher for quest files (dev mode)
        #[cfg(debug_assertions)]
        {
            match catalog.start_file_watcher() {
                Ok(mut rx) => {
                    // Spawn task to log reload events
                    tokio::spawn(async move {
                        while let Some(event) = rx.recv().await {
                            match event {
                                quest::HotReloadEvent::Reloaded(path) => {
                                    info!("Quest hot-reload: {}", path);
                                }
                                quest::HotReloadEvent::Error(e) => {
                                    error!("Quest hot-reload error: {}", e);
                                }
                            }
                        }
                    });
                    info!("Quest hot-reload enabled");
                }
                Err(e) => {
                    warn!("Failed to start quest hot-reload: {}", e);
                }
            }
        }

        let ctx = Arc::new(BotContext::new(
            config.clone(),
            db,
            catalog,
            Arc::new(ThreadRngSource),
            trivia,
        ));

        Self { ctx, config }
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis()
    }))
}

/// POST /webhook - one platform update in, the outbound actions out.
async fn webhook(
    State(state): State<AppState>,
    Json(update): Json<IncomingUpdate>,
) -> impl IntoResponse {
    debug!(
        "Update from user {} in chat {}",
        update.user_id(),
        update.chat_id()
    );
    let outbox = Outbox::new();
    router::handle_update(&state.ctx, &outbox, update).await;
    Json(outbox.take_actions().await)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("manga_tactical_bot=info".parse().unwrap()),
        )
        .init();

    let state = AppState::new().await;
    let bind_addr = state.config.bind_addr.clone();

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Bot server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}

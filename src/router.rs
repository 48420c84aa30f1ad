//! Update Routing
//!
//! Dispatches platform updates to command, decision, media and text handlers.
//! Access restriction is composed as explicit guard functions at the top of
//! each handler path: capability check, then proceed or short-circuit.

use std::sync::Arc;

use chrono::Timelike;
use dashmap::DashMap;
use tracing::{debug, error, warn};

use crate::character::CharacterStore;
use crate::config::BotConfig;
use crate::db::Database;
use crate::error::BotError;
use crate::gateway::MessagingGateway;
use crate::protocol::{DecisionKeyboard, IncomingUpdate};
use crate::quest::{QuestCatalog, QuestChoice, QuestEngine, QuestOutcome, RandomSource};
use crate::session::SessionStore;
use crate::trivia::TriviaRegistry;

const HELP_TEXT: &str = "Je n'ai pas compris votre message. Voici ce que je peux faire :\n\
/start - Commencer une nouvelle partie\n\
/status - Voir le statut de votre personnage\n\
/quest - Obtenir une nouvelle quête\n\
/recommend - Obtenir une recommandation de manga\n\
/fact - Apprendre un fait intéressant sur les mangas\n\
/add_photo - Ajouter une photo à votre personnage";

/// Per-owner progress through the two-step reference-image upload.
#[derive(Clone)]
enum PendingUpload {
    /// `/upload_character_image` issued, no attachment yet
    AwaitingImage,
    /// Attachment stashed, waiting for the character name
    AwaitingName(Vec<u8>),
}

/// Shared handler state, one per process.
pub struct BotContext {
    pub config: Arc<BotConfig>,
    pub db: Arc<Database>,
    pub characters: CharacterStore,
    pub engine: QuestEngine,
    pub trivia: TriviaRegistry,
    pending_uploads: DashMap<i64, PendingUpload>,
}

impl BotContext {
    pub fn new(
        config: Arc<BotConfig>,
        db: Arc<Database>,
        catalog: Arc<QuestCatalog>,
        random: Arc<dyn RandomSource>,
        trivia: TriviaRegistry,
    ) -> Self {
        let characters = CharacterStore::new(db.clone());
        let sessions = SessionStore::new(db.clone());
        let engine = QuestEngine::new(catalog, characters.clone(), sessions, random);
        Self {
            config,
            db,
            characters,
            engine,
            trivia,
            pending_uploads: DashMap::new(),
        }
    }
}

/// Entry point: route one update to its handler.
pub async fn handle_update(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    update: IncomingUpdate,
) {
    match update {
        IncomingUpdate::Command { name, user_id, chat_id } => {
            if !guard_allowed_chat(ctx, gateway, chat_id).await {
                return;
            }
            handle_command(ctx, gateway, &name, user_id, chat_id).await;
        }
        IncomingUpdate::Callback { action, user_id, message_id, .. } => {
            handle_decision(ctx, gateway, &action, user_id, message_id).await;
        }
        IncomingUpdate::Photo { user_id, chat_id, bytes } => {
            if !guard_allowed_chat(ctx, gateway, chat_id).await {
                return;
            }
            handle_portrait_photo(ctx, gateway, user_id, chat_id, bytes).await;
        }
        IncomingUpdate::Document { user_id, chat_id, bytes } => {
            if !guard_allowed_chat(ctx, gateway, chat_id).await {
                return;
            }
            handle_reference_document(ctx, gateway, user_id, chat_id, bytes).await;
        }
        IncomingUpdate::Text { user_id, chat_id, text } => {
            if !guard_allowed_chat(ctx, gateway, chat_id).await {
                return;
            }
            handle_text(ctx, gateway, user_id, chat_id, &text).await;
        }
    }
}

// ============================================================================
// Guards
// ============================================================================

/// Group allowlist check. Short-circuits with a refusal message.
async fn guard_allowed_chat(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    chat_id: i64,
) -> bool {
    if ctx.config.is_allowed_chat(chat_id) {
        return true;
    }
    debug!("Rejected update from disallowed chat {}", chat_id);
    gateway
        .send_text(chat_id, "Ce bot n'est pas autorisé dans ce groupe.", None)
        .await;
    false
}

/// Owner check for reference-image uploads.
async fn guard_owner(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    user_id: i64,
    chat_id: i64,
) -> bool {
    if ctx.config.is_privileged_user(user_id) {
        return true;
    }
    warn!("User {} attempted a privileged upload", user_id);
    gateway
        .send_text(
            chat_id,
            "Seuls les propriétaires du bot peuvent uploader des images de personnages.",
            None,
        )
        .await;
    false
}

// ============================================================================
// Commands
// ============================================================================

async fn handle_command(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    name: &str,
    user_id: i64,
    chat_id: i64,
) {
    match name {
        "start" => cmd_start(ctx, gateway, user_id, chat_id).await,
        "status" => cmd_status(ctx, gateway, user_id, chat_id).await,
        "quest" => cmd_quest(ctx, gateway, user_id, chat_id).await,
        "recommend" => {
            let pick = ctx.trivia.pick_recommendation();
            gateway
                .send_text(chat_id, &format!("Je vous recommande de lire : {}", pick), None)
                .await;
        }
        "fact" => {
            let pick = ctx.trivia.pick_fact();
            gateway
                .send_text(chat_id, &format!("Saviez-vous que : {}", pick), None)
                .await;
        }
        "add_photo" => {
            gateway
                .send_text(
                    chat_id,
                    "Veuillez envoyer une photo pour mettre à jour l'image de votre personnage.",
                    None,
                )
                .await;
        }
        "upload_character_image" => {
            if guard_owner(ctx, gateway, user_id, chat_id).await {
                ctx.pending_uploads.insert(user_id, PendingUpload::AwaitingImage);
                gateway
                    .send_text(chat_id, "Veuillez envoyer une image en pièce jointe.", None)
                    .await;
            }
        }
        _ => {
            gateway.send_text(chat_id, HELP_TEXT, None).await;
        }
    }
}

async fn cmd_start(ctx: &BotContext, gateway: &dyn MessagingGateway, user_id: i64, chat_id: i64) {
    let character = match ctx.characters.get_or_create(user_id).await {
        Ok(c) => c,
        Err(e) => {
            return report_error(gateway, chat_id, &e, "start").await;
        }
    };

    let text = format!(
        "{} et bienvenue dans le monde manga tactique! Votre héros '{}' est prêt pour l'aventure.\n\n\
         Utilisez /status pour voir vos statistiques, /quest pour obtenir une quête, \
         /recommend pour obtenir une recommandation de manga ou /fact pour un fait amusant sur les mangas.",
        current_greeting(),
        character.name
    );
    gateway.send_text(chat_id, &text, None).await;
}

async fn cmd_status(ctx: &BotContext, gateway: &dyn MessagingGateway, user_id: i64, chat_id: i64) {
    let character = match ctx.characters.get_or_create(user_id).await {
        Ok(c) => c,
        Err(e) => {
            return report_error(gateway, chat_id, &e, "status").await;
        }
    };

    let status = character.status_text();
    match character.portrait {
        Some(ref photo) => gateway.send_photo(chat_id, photo, &status).await,
        None => gateway.send_text(chat_id, &status, None).await,
    }
}

async fn cmd_quest(ctx: &BotContext, gateway: &dyn MessagingGateway, user_id: i64, chat_id: i64) {
    match ctx.engine.issue(user_id).await {
        Ok(quest) => {
            gateway
                .send_text(
                    chat_id,
                    &quest.offer_text(),
                    Some(DecisionKeyboard::accept_refuse()),
                )
                .await;
        }
        Err(e @ BotError::QuestAlreadyActive(_)) => {
            gateway.send_text(chat_id, e.user_message(), None).await;
        }
        Err(e) => report_error(gateway, chat_id, &e, "quest").await,
    }
}

// ============================================================================
// Quest decisions
// ============================================================================

async fn handle_decision(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    action: &str,
    user_id: i64,
    message_id: i64,
) {
    let Some(choice) = QuestChoice::from_action(action) else {
        warn!("Unknown callback action '{}' from user {}", action, user_id);
        return;
    };

    match ctx.engine.decide(user_id, choice).await {
        Ok(QuestOutcome::Succeeded { quest, granted }) => {
            gateway
                .edit_message(
                    message_id,
                    &format!(
                        "Félicitations! Vous avez réussi la quête '{}'.\nVous avez gagné: {}.",
                        quest.name,
                        granted.join(", ")
                    ),
                )
                .await;
        }
        Ok(QuestOutcome::Failed { quest }) => {
            gateway
                .edit_message(
                    message_id,
                    &format!(
                        "Malheureusement, vous avez échoué à la quête '{}'.\nReposez-vous et réessayez plus tard!",
                        quest.name
                    ),
                )
                .await;
        }
        Ok(QuestOutcome::Refused { .. }) => {
            gateway
                .edit_message(
                    message_id,
                    "Vous avez refusé la quête. Une autre sera disponible plus tard.",
                )
                .await;
        }
        Err(e @ BotError::NoActiveQuest(_)) => {
            // Stale affordance, e.g. a second tap on an already resolved quest
            debug!("Stale decision from user {}: {}", user_id, e);
            gateway.edit_message(message_id, e.user_message()).await;
        }
        Err(e) => {
            error!("Quest decision failed for user {}: {}", user_id, e);
            gateway.edit_message(message_id, e.user_message()).await;
        }
    }
}

// ============================================================================
// Media
// ============================================================================

async fn handle_portrait_photo(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    user_id: i64,
    chat_id: i64,
    bytes: Vec<u8>,
) {
    match ctx.characters.set_portrait(user_id, bytes).await {
        Ok(()) => {
            gateway
                .send_text(
                    chat_id,
                    "La photo de votre personnage a été mise à jour avec succès!",
                    None,
                )
                .await;
        }
        Err(e) => report_error(gateway, chat_id, &e, "add_photo").await,
    }
}

async fn handle_reference_document(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    user_id: i64,
    chat_id: i64,
    bytes: Vec<u8>,
) {
    if !guard_owner(ctx, gateway, user_id, chat_id).await {
        return;
    }

    ctx.pending_uploads
        .insert(user_id, PendingUpload::AwaitingName(bytes));
    gateway
        .send_text(chat_id, "Pour quel personnage est cette image ? (Envoyez le nom)", None)
        .await;
}

/// Second step of the owner upload flow: the text names the character.
/// Returns false when no upload was pending for this owner.
async fn try_finish_reference_upload(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    user_id: i64,
    chat_id: i64,
    character_name: &str,
) -> bool {
    if !ctx.config.is_privileged_user(user_id) {
        return false;
    }
    let Some(pending) = ctx
        .pending_uploads
        .get(&user_id)
        .map(|entry| entry.value().clone())
    else {
        return false;
    };
    let bytes = match pending {
        PendingUpload::AwaitingName(bytes) => bytes,
        PendingUpload::AwaitingImage => {
            gateway
                .send_text(
                    chat_id,
                    "Aucune image en attente. Veuillez d'abord envoyer une image.",
                    None,
                )
                .await;
            return true;
        }
    };

    let name = character_name.trim().to_lowercase();
    let result = async {
        let image_id = ctx.db.insert_image(&bytes).await?;
        ctx.db.link_image(&name, &image_id).await?;
        Ok::<_, BotError>(image_id)
    }
    .await;

    match result {
        Ok(image_id) => {
            // Only drop the pending bytes once the image is stored
            ctx.pending_uploads.remove(&user_id);
            debug!("Stored reference image {} for '{}'", image_id, name);
            gateway
                .send_text(
                    chat_id,
                    &format!("Image uploadée avec succès pour {}!", capitalize(&name)),
                    None,
                )
                .await;
        }
        Err(e) => report_error(gateway, chat_id, &e, "upload_character_image").await,
    }
    true
}

// ============================================================================
// Free text
// ============================================================================

async fn handle_text(
    ctx: &BotContext,
    gateway: &dyn MessagingGateway,
    user_id: i64,
    chat_id: i64,
    text: &str,
) {
    if try_finish_reference_upload(ctx, gateway, user_id, chat_id, text).await {
        return;
    }

    let lower = text.to_lowercase();

    let reply: String = if ["bonjour", "salut", "coucou", "hello"]
        .iter()
        .any(|w| lower.contains(w))
    {
        format!(
            "{}! Comment puis-je vous aider aujourd'hui dans votre aventure ?",
            current_greeting()
        )
    } else if lower.contains("bonsoir") {
        "Bonsoir! Prêt pour une aventure nocturne ?".to_string()
    } else if lower.contains("merci") {
        "De rien! C'est toujours un plaisir d'aider un héros comme vous.".to_string()
    } else if lower.contains("au revoir") || lower.contains("adieu") {
        "Au revoir! J'espère vous revoir bientôt pour de nouvelles aventures!".to_string()
    } else if lower.contains("recommande") || lower.contains("manga") {
        format!("Je vous recommande de lire : {}", ctx.trivia.pick_recommendation())
    } else if lower.contains("fait") || lower.contains("info") {
        format!("Saviez-vous que : {}", ctx.trivia.pick_fact())
    } else {
        HELP_TEXT.to_string()
    };

    gateway.send_text(chat_id, &reply, None).await;
}

// ============================================================================
// Helpers
// ============================================================================

/// Greeting for the local hour of day.
fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Bonjour",
        12..=17 => "Bon après-midi",
        _ => "Bonsoir",
    }
}

fn current_greeting() -> &'static str {
    greeting_for_hour(chrono::Local::now().hour())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

async fn report_error(gateway: &dyn MessagingGateway, chat_id: i64, e: &BotError, op: &str) {
    if e.is_retryable() {
        warn!("Operation '{}' failed, user may retry: {}", op, e);
    } else {
        error!("Operation '{}' failed: {}", op, e);
    }
    gateway.send_text(chat_id, e.user_message(), None).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Outbox;
    use crate::protocol::{ACTION_ACCEPT_QUEST, ACTION_REFUSE_QUEST, OutgoingAction};
    use crate::quest::Quest;
    use crate::quest::catalog::built_in_quests;

    const CHAT: i64 = -100500;
    const USER: i64 = 42;
    const OWNER: i64 = 1;

    struct FixedRoll(f64);

    impl RandomSource for FixedRoll {
        fn roll(&self) -> f64 {
            self.0
        }
    }

    async fn context(quests: Vec<Quest>, roll: f64) -> BotContext {
        let config = BotConfig {
            allowed_group_ids: vec![CHAT],
            owner_ids: vec![OWNER],
            ..BotConfig::default()
        };
        let db = Arc::new(Database::new_in_memory().await);
        BotContext::new(
            Arc::new(config),
            db,
            Arc::new(QuestCatalog::with_quests(quests)),
            Arc::new(FixedRoll(roll)),
            TriviaRegistry::new(),
        )
    }

    fn treasure_hunt() -> Quest {
        built_in_quests()
            .into_iter()
            .find(|q| q.name == "Chasse aux trésors")
            .unwrap()
    }

    fn command(name: &str) -> IncomingUpdate {
        command_from(USER, name)
    }

    fn command_from(user_id: i64, name: &str) -> IncomingUpdate {
        IncomingUpdate::Command {
            name: name.to_string(),
            user_id,
            chat_id: CHAT,
        }
    }

    fn text(user_id: i64, body: &str) -> IncomingUpdate {
        IncomingUpdate::Text {
            user_id,
            chat_id: CHAT,
            text: body.to_string(),
        }
    }

    fn callback(user_id: i64, action: &str) -> IncomingUpdate {
        IncomingUpdate::Callback {
            action: action.to_string(),
            user_id,
            chat_id: CHAT,
            message_id: 7,
        }
    }

    async fn sent_text(outbox: &Outbox) -> String {
        match outbox.take_actions().await.remove(0) {
            OutgoingAction::SendText { text, .. } => text,
            other => panic!("expected SendText, got {:?}", other),
        }
    }

    #[test]
    fn test_greeting_by_hour() {
        assert_eq!(greeting_for_hour(6), "Bonjour");
        assert_eq!(greeting_for_hour(11), "Bonjour");
        assert_eq!(greeting_for_hour(12), "Bon après-midi");
        assert_eq!(greeting_for_hour(17), "Bon après-midi");
        assert_eq!(greeting_for_hour(18), "Bonsoir");
        assert_eq!(greeting_for_hour(3), "Bonsoir");
    }

    #[tokio::test]
    async fn test_disallowed_chat_is_refused() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();
        let update = IncomingUpdate::Command {
            name: "start".to_string(),
            user_id: USER,
            chat_id: -999,
        };
        handle_update(&ctx, &outbox, update).await;

        let actions = outbox.take_actions().await;
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            OutgoingAction::SendText { chat_id, text, .. } => {
                assert_eq!(*chat_id, -999);
                assert_eq!(text, "Ce bot n'est pas autorisé dans ce groupe.");
            }
            other => panic!("expected SendText, got {:?}", other),
        }
        // No character was created
        assert!(ctx.db.get_character(USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_creates_character_and_welcomes() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, command("start")).await;

        let text = sent_text(&outbox).await;
        assert!(text.contains("bienvenue dans le monde manga tactique"));
        assert!(text.contains("Héros Manga"));
        assert!(ctx.db.get_character(USER).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_status_without_portrait_sends_text() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, command("status")).await;

        let text = sent_text(&outbox).await;
        assert!(text.contains("Statut de Héros Manga:"));
        assert!(text.contains("Argent: 100 pièces"));
    }

    #[tokio::test]
    async fn test_status_with_portrait_sends_photo() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();
        handle_update(
            &ctx,
            &outbox,
            IncomingUpdate::Photo {
                user_id: USER,
                chat_id: CHAT,
                bytes: vec![9, 9, 9],
            },
        )
        .await;
        assert!(sent_text(&outbox).await.contains("mise à jour avec succès"));

        handle_update(&ctx, &outbox, command("status")).await;
        match outbox.take_actions().await.remove(0) {
            OutgoingAction::SendPhoto { photo, caption, .. } => {
                assert_eq!(photo, vec![9, 9, 9]);
                assert!(caption.contains("Statut de"));
            }
            other => panic!("expected SendPhoto, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quest_offer_carries_decision_keyboard() {
        let ctx = context(vec![treasure_hunt()], 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, command("quest")).await;

        match outbox.take_actions().await.remove(0) {
            OutgoingAction::SendText { text, keyboard, .. } => {
                assert!(text.contains("Nouvelle quête disponible: Chasse aux trésors"));
                assert!(text.contains("Difficulté: Facile"));
                assert_eq!(keyboard, Some(DecisionKeyboard::accept_refuse()));
            }
            other => panic!("expected SendText, got {:?}", other),
        }

        // A second /quest while one is pending is rejected
        handle_update(&ctx, &outbox, command("quest")).await;
        let text = sent_text(&outbox).await;
        assert_eq!(text, "Vous avez déjà une quête en cours. Terminez-la d'abord!");
    }

    #[tokio::test]
    async fn test_accept_success_scenario_grants_reward() {
        let ctx = context(vec![treasure_hunt()], 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, command("quest")).await;
        outbox.take_actions().await;

        handle_update(&ctx, &outbox, callback(USER, ACTION_ACCEPT_QUEST)).await;
        match outbox.take_actions().await.remove(0) {
            OutgoingAction::EditMessage { message_id, text } => {
                assert_eq!(message_id, 7);
                assert!(text.contains("Félicitations! Vous avez réussi la quête 'Chasse aux trésors'"));
                assert!(text.contains("100 pièces, Amulette de force"));
            }
            other => panic!("expected EditMessage, got {:?}", other),
        }

        let character = ctx.db.get_character(USER).await.unwrap().unwrap();
        assert_eq!(character.money, 200);
        assert_eq!(character.artifacts, vec!["Amulette de force"]);
    }

    #[tokio::test]
    async fn test_refuse_edits_message() {
        let ctx = context(vec![treasure_hunt()], 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, command("quest")).await;
        outbox.take_actions().await;

        handle_update(&ctx, &outbox, callback(USER, ACTION_REFUSE_QUEST)).await;
        match outbox.take_actions().await.remove(0) {
            OutgoingAction::EditMessage { text, .. } => {
                assert_eq!(text, "Vous avez refusé la quête. Une autre sera disponible plus tard.");
            }
            other => panic!("expected EditMessage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_decision_reports_unavailable() {
        let ctx = context(vec![treasure_hunt()], 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, callback(USER, ACTION_ACCEPT_QUEST)).await;

        match outbox.take_actions().await.remove(0) {
            OutgoingAction::EditMessage { text, .. } => {
                assert_eq!(text, "Cette quête n'est plus disponible.");
            }
            other => panic!("expected EditMessage, got {:?}", other),
        }
        // No store writes
        assert!(ctx.db.get_session(USER).await.unwrap().is_none());
        assert!(ctx.db.get_character(USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_reference_upload_flow() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();

        handle_update(
            &ctx,
            &outbox,
            IncomingUpdate::Document {
                user_id: OWNER,
                chat_id: CHAT,
                bytes: vec![0xca, 0xfe],
            },
        )
        .await;
        assert!(sent_text(&outbox).await.contains("Pour quel personnage"));

        handle_update(&ctx, &outbox, text(OWNER, "Luffy")).await;
        assert_eq!(
            sent_text(&outbox).await,
            "Image uploadée avec succès pour Luffy!"
        );

        let image = ctx.db.get_image_for_name("luffy").await.unwrap();
        assert_eq!(image, Some(vec![0xca, 0xfe]));

        // The pending upload is consumed; the same text now routes normally
        handle_update(&ctx, &outbox, text(OWNER, "Luffy")).await;
        assert_eq!(sent_text(&outbox).await, HELP_TEXT);
    }

    #[tokio::test]
    async fn test_owner_name_before_attachment_is_prompted() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();

        handle_update(&ctx, &outbox, command_from(OWNER, "upload_character_image")).await;
        assert_eq!(
            sent_text(&outbox).await,
            "Veuillez envoyer une image en pièce jointe."
        );

        // Naming a character before sending the attachment
        handle_update(&ctx, &outbox, text(OWNER, "Luffy")).await;
        assert_eq!(
            sent_text(&outbox).await,
            "Aucune image en attente. Veuillez d'abord envoyer une image."
        );
        assert_eq!(ctx.db.get_image_for_name("luffy").await.unwrap(), None);

        // The attachment completes the flow as usual
        handle_update(
            &ctx,
            &outbox,
            IncomingUpdate::Document {
                user_id: OWNER,
                chat_id: CHAT,
                bytes: vec![7],
            },
        )
        .await;
        outbox.take_actions().await;
        handle_update(&ctx, &outbox, text(OWNER, "Luffy")).await;
        assert_eq!(
            sent_text(&outbox).await,
            "Image uploadée avec succès pour Luffy!"
        );
    }

    #[tokio::test]
    async fn test_non_owner_cannot_upload_reference() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();
        handle_update(
            &ctx,
            &outbox,
            IncomingUpdate::Document {
                user_id: USER,
                chat_id: CHAT,
                bytes: vec![1],
            },
        )
        .await;
        assert!(sent_text(&outbox).await.contains("Seuls les propriétaires"));
    }

    #[tokio::test]
    async fn test_text_keyword_routing() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();

        handle_update(&ctx, &outbox, text(USER, "Merci beaucoup!")).await;
        assert!(sent_text(&outbox).await.starts_with("De rien!"));

        handle_update(&ctx, &outbox, text(USER, "tu me recommande quoi ?")).await;
        assert!(sent_text(&outbox).await.starts_with("Je vous recommande de lire :"));

        handle_update(&ctx, &outbox, text(USER, "un fait intéressant ?")).await;
        assert!(sent_text(&outbox).await.starts_with("Saviez-vous que :"));

        handle_update(&ctx, &outbox, text(USER, "xyzzy")).await;
        assert_eq!(sent_text(&outbox).await, HELP_TEXT);
    }

    #[tokio::test]
    async fn test_unknown_command_sends_help() {
        let ctx = context(built_in_quests(), 0.0).await;
        let outbox = Outbox::new();
        handle_update(&ctx, &outbox, command("dance")).await;
        assert_eq!(sent_text(&outbox).await, HELP_TEXT);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("luffy"), "Luffy");
        assert_eq!(capitalize("épée"), "Épée");
        assert_eq!(capitalize(""), "");
    }
}

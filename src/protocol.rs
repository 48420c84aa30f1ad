use serde::{Deserialize, Serialize};

// ============================================================================
// Platform -> Bot Updates
// ============================================================================

/// A discrete event delivered by the messaging platform webhook.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingUpdate {
    /// A slash command, e.g. `/quest`
    #[serde(rename = "command")]
    Command {
        name: String,
        user_id: i64,
        chat_id: i64,
    },

    /// A button press on a previously sent decision affordance
    #[serde(rename = "callback")]
    Callback {
        action: String,
        user_id: i64,
        chat_id: i64,
        message_id: i64,
    },

    /// A photo attached by the user (portrait update)
    #[serde(rename = "photo")]
    Photo {
        user_id: i64,
        chat_id: i64,
        bytes: Vec<u8>,
    },

    /// A document attachment (owner reference-image upload)
    #[serde(rename = "document")]
    Document {
        user_id: i64,
        chat_id: i64,
        bytes: Vec<u8>,
    },

    /// Plain text message
    #[serde(rename = "text")]
    Text {
        user_id: i64,
        chat_id: i64,
        text: String,
    },
}

impl IncomingUpdate {
    pub fn chat_id(&self) -> i64 {
        match self {
            IncomingUpdate::Command { chat_id, .. }
            | IncomingUpdate::Callback { chat_id, .. }
            | IncomingUpdate::Photo { chat_id, .. }
            | IncomingUpdate::Document { chat_id, .. }
            | IncomingUpdate::Text { chat_id, .. } => *chat_id,
        }
    }

    pub fn user_id(&self) -> i64 {
        match self {
            IncomingUpdate::Command { user_id, .. }
            | IncomingUpdate::Callback { user_id, .. }
            | IncomingUpdate::Photo { user_id, .. }
            | IncomingUpdate::Document { user_id, .. }
            | IncomingUpdate::Text { user_id, .. } => *user_id,
        }
    }
}

// ============================================================================
// Bot -> Platform Actions
// ============================================================================

/// Callback actions attached to decision buttons.
pub const ACTION_ACCEPT_QUEST: &str = "accept_quest";
pub const ACTION_REFUSE_QUEST: &str = "refuse_quest";

/// One button of an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub label: String,
    pub action: String,
}

/// The accept/refuse choice presented alongside an issued quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionKeyboard {
    pub buttons: Vec<KeyboardButton>,
}

impl DecisionKeyboard {
    pub fn accept_refuse() -> Self {
        Self {
            buttons: vec![
                KeyboardButton {
                    label: "Accepter".to_string(),
                    action: ACTION_ACCEPT_QUEST.to_string(),
                },
                KeyboardButton {
                    label: "Refuser".to_string(),
                    action: ACTION_REFUSE_QUEST.to_string(),
                },
            ],
        }
    }
}

/// Outbound action for the platform to execute, returned in the webhook reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingAction {
    #[serde(rename = "sendText")]
    SendText {
        chat_id: i64,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        keyboard: Option<DecisionKeyboard>,
    },

    #[serde(rename = "sendPhoto")]
    SendPhoto {
        chat_id: i64,
        photo: Vec<u8>,
        caption: String,
    },

    #[serde(rename = "editMessage")]
    EditMessage { message_id: i64, text: String },
}

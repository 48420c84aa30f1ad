//! Messaging Gateway
//!
//! Seam between the bot's business logic and the messaging platform.
//! Handlers talk to the trait; the webhook server hands them an [`Outbox`]
//! whose collected actions become the HTTP response body.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::protocol::{DecisionKeyboard, OutgoingAction};

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a text message, optionally with a decision affordance attached.
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<DecisionKeyboard>);

    /// Send a photo with a caption.
    async fn send_photo(&self, chat_id: i64, photo: &[u8], caption: &str);

    /// Edit a previously sent message in place.
    async fn edit_message(&self, message_id: i64, text: &str);
}

/// Gateway that buffers outbound actions for the webhook reply.
#[derive(Default)]
pub struct Outbox {
    actions: Mutex<Vec<OutgoingAction>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the buffered actions.
    pub async fn take_actions(&self) -> Vec<OutgoingAction> {
        std::mem::take(&mut *self.actions.lock().await)
    }
}

#[async_trait]
impl MessagingGateway for Outbox {
    async fn send_text(&self, chat_id: i64, text: &str, keyboard: Option<DecisionKeyboard>) {
        self.actions.lock().await.push(OutgoingAction::SendText {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
    }

    async fn send_photo(&self, chat_id: i64, photo: &[u8], caption: &str) {
        self.actions.lock().await.push(OutgoingAction::SendPhoto {
            chat_id,
            photo: photo.to_vec(),
            caption: caption.to_string(),
        });
    }

    async fn edit_message(&self, message_id: i64, text: &str) {
        self.actions.lock().await.push(OutgoingAction::EditMessage {
            message_id,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_collects_in_order() {
        let outbox = Outbox::new();
        outbox.send_text(1, "premier", None).await;
        outbox.edit_message(9, "second").await;

        let actions = outbox.take_actions().await;
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], OutgoingAction::SendText { chat_id: 1, .. }));
        assert!(matches!(actions[1], OutgoingAction::EditMessage { message_id: 9, .. }));

        // Draining empties the buffer
        assert!(outbox.take_actions().await.is_empty());
    }
}

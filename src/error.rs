//! Error Taxonomy
//!
//! Every failure surfaces a user-readable message; none crash the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// User tried to issue a quest while one is still pending.
    #[error("user {0} already has an active quest")]
    QuestAlreadyActive(i64),

    /// A decision arrived with nothing pending (stale affordance).
    #[error("user {0} has no active quest")]
    NoActiveQuest(i64),

    /// A store operation failed. The in-progress state transition is aborted.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A stored document could not be encoded or decoded.
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl BotError {
    /// Message shown to the user. Internal detail is never exposed.
    pub fn user_message(&self) -> &'static str {
        match self {
            BotError::QuestAlreadyActive(_) => {
                "Vous avez déjà une quête en cours. Terminez-la d'abord!"
            }
            BotError::NoActiveQuest(_) => "Cette quête n'est plus disponible.",
            BotError::Persistence(_) | BotError::Encoding(_) | BotError::Other(_) => {
                "Une erreur est survenue. Veuillez réessayer plus tard."
            }
        }
    }

    /// Whether the user can safely retry the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BotError::Persistence(_))
    }
}

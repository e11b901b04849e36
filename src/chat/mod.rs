//! Assistant conversation flow
//!
//! Guests keep their conversation in the keyed store under
//! [`keys::CHAT_DRAFT`]; logged-in users keep it on the chat service,
//! addressed by their user id. A failed answer is added to the
//! conversation as a bot line, so the user always sees why.

use crate::error::{NeoCareError, Result};
use crate::gateway::AnalysisGateway;
use crate::store::{keys, KeyValueStore, StoreExt};
use neocare_common::{ChatMessage, Conversation, Sender};
use std::sync::Arc;

const SESSION_EXPIRED_REPLY: &str = "Your session has expired. Please log in again.";
const UNREACHABLE_REPLY: &str = "Unable to connect to the AI service. Please make sure the AI service is running.";
const FALLBACK_REPLY: &str = "An error occurred while processing your request.";

pub struct ChatAssistant<'a> {
    gateway: &'a AnalysisGateway,
    store: Arc<dyn KeyValueStore>,
    user: Option<String>,
}

impl<'a> ChatAssistant<'a> {
    pub fn new(gateway: &'a AnalysisGateway, store: Arc<dyn KeyValueStore>, user_id: Option<&str>) -> Self {
        let user = user_id.map(str::trim).filter(|id| !id.is_empty()).map(str::to_string);
        Self { gateway, store, user }
    }

    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }

    /// The saved conversation, or a fresh one
    pub async fn load(&self) -> Result<Conversation> {
        match &self.user {
            Some(user) => match self.gateway.get_conversation(user).await {
                Ok(conversation) => Ok(conversation),
                Err(NeoCareError::SessionExpired) => Err(NeoCareError::SessionExpired),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot load conversation, starting a new one");
                    Ok(Conversation::default())
                }
            },
            None => match self.store.get_as::<Conversation>(keys::CHAT_DRAFT) {
                Ok(Some(conversation)) => Ok(conversation),
                Ok(None) => Ok(Conversation::default()),
                Err(NeoCareError::Json(e)) => {
                    tracing::warn!(error = %e, "unreadable chat draft, starting a new one");
                    Ok(Conversation::default())
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Ask the assistant; returns the bot line that was added.
    ///
    /// Only an expired session is returned as an error, after the
    /// conversation has been saved with the explanation in it.
    pub async fn send(&self, conversation: &mut Conversation, text: &str) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NeoCareError::EmptyMessage);
        }
        conversation.push(Sender::User, text);

        let (reply, expired) = match self.gateway.chat_message(text).await {
            Ok(answer) => (answer, false),
            Err(NeoCareError::SessionExpired) => (SESSION_EXPIRED_REPLY.to_string(), true),
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "assistant did not answer");
                (failure_reply(&e), false)
            }
        };
        let message = conversation.push(Sender::Bot, reply).clone();

        self.save(conversation).await?;
        if expired {
            return Err(NeoCareError::SessionExpired);
        }
        Ok(message)
    }

    /// Start over with the welcome line
    pub async fn clear(&self) -> Result<Conversation> {
        let conversation = Conversation::default();
        match &self.user {
            Some(user) => self.gateway.clear_conversation(user).await?,
            None => self.store.set_as(keys::CHAT_DRAFT, &conversation)?,
        }
        Ok(conversation)
    }

    /// Service failures for logged-in users are logged, not returned
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        match &self.user {
            Some(user) => {
                if let Err(e) = self.gateway.save_conversation(user, conversation.messages()).await {
                    tracing::warn!(error = %e, "failed to save conversation");
                }
                Ok(())
            }
            None => self.store.set_as(keys::CHAT_DRAFT, conversation),
        }
    }
}

/// Drop the guest conversation; done at login
pub fn discard_guest_draft(store: &dyn KeyValueStore) -> Result<bool> {
    store.delete(keys::CHAT_DRAFT)
}

fn failure_reply(error: &NeoCareError) -> String {
    match error {
        NeoCareError::Transport(_) => UNREACHABLE_REPLY.to_string(),
        NeoCareError::Service { message, .. } if !message.starts_with("HTTP ") => message.clone(),
        _ => FALLBACK_REPLY.to_string(),
    }
}

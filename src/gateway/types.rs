//! Wire shapes of the service responses that are not part of the shared model

use neocare_common::{ChatMessage, Language, StoreCandidate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranslateRequest<'a> {
    pub text: &'a str,
    pub target_lang: Language,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranslateResponse {
    #[serde(default)]
    pub translated_text: Option<String>,
}

/// Error body of a non-2xx answer
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

/// `GET /nearby-stores` answers either a bare array or an envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NearbyStores {
    Bare(Vec<StoreCandidate>),
    Envelope {
        #[serde(default)]
        stores: Vec<StoreCandidate>,
    },
}

impl NearbyStores {
    pub fn into_stores(self) -> Vec<StoreCandidate> {
        match self {
            NearbyStores::Envelope { stores } => stores,
            NearbyStores::Bare(stores) => stores,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SaveConversation<'a> {
    pub user_email: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoredConversation {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

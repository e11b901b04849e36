//! Assistant chat tests
//!
//! Guest drafts in the store, user conversations on the service

use mockito::Matcher;
use neocare_common::{Conversation, Sender, WELCOME_MESSAGE};
use neocare_rust::chat::{self, ChatAssistant};
use neocare_rust::error::NeoCareError;
use neocare_rust::gateway::{AnalysisGateway, Endpoints};
use neocare_rust::store::{keys, KeyValueStore, MemoryStore, StoreExt};
use serde_json::json;
use std::sync::Arc;

fn gateway(url: &str) -> AnalysisGateway {
    AnalysisGateway::new(Endpoints::with_host(url), None, None).unwrap()
}

fn store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

// =============================================
// Guest
// =============================================

/// A guest starts with the welcome line and keeps the draft locally
#[tokio::test]
async fn test_guest_conversation_saved_locally() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/chat/message")
        .with_status(200)
        .with_body(r#"{"response":"Rest and drink fluids."}"#)
        .create_async()
        .await;
    let save = server
        .mock("POST", "/api/chat/save-conversation")
        .expect(0)
        .create_async()
        .await;

    let store = store();
    let gw = gateway(&server.url());
    let assistant = ChatAssistant::new(&gw, Arc::clone(&store), None);
    assert!(assistant.is_guest());

    let mut conversation = assistant.load().await.unwrap();
    assert_eq!(conversation.messages()[0].text, WELCOME_MESSAGE);

    let reply = assistant.send(&mut conversation, "  I feel feverish ").await.unwrap();
    assert_eq!(reply.sender, Sender::Bot);
    assert_eq!(reply.text, "Rest and drink fluids.");
    assert_eq!(conversation.messages()[1].text, "I feel feverish");

    let draft: Conversation = store.require(keys::CHAT_DRAFT).unwrap();
    assert_eq!(draft, conversation);

    let reloaded = ChatAssistant::new(&gw, Arc::clone(&store), Some("  ")).load().await.unwrap();
    assert_eq!(reloaded.messages().len(), 3);
    save.assert_async().await;
}

/// An unreachable service leaves an explanation in the conversation
#[tokio::test]
async fn test_unreachable_service_adds_bot_line() {
    let store = store();
    let gw = gateway("http://127.0.0.1:1");
    let assistant = ChatAssistant::new(&gw, Arc::clone(&store), None);

    let mut conversation = assistant.load().await.unwrap();
    let reply = assistant.send(&mut conversation, "hello").await.unwrap();
    assert_eq!(reply.sender, Sender::Bot);
    assert!(reply.text.starts_with("Unable to connect"));

    let draft: Conversation = store.require(keys::CHAT_DRAFT).unwrap();
    assert_eq!(draft.messages().len(), 3);
}

/// Blank input is refused and nothing is added
#[tokio::test]
async fn test_blank_message_refused() {
    let gw = gateway("http://127.0.0.1:1");
    let assistant = ChatAssistant::new(&gw, store(), None);
    let mut conversation = Conversation::default();

    let err = assistant.send(&mut conversation, "   ").await.unwrap_err();
    assert!(matches!(err, NeoCareError::EmptyMessage));
    assert_eq!(conversation.messages().len(), 1);
}

/// A corrupt draft is replaced by a fresh conversation
#[tokio::test]
async fn test_corrupt_draft_starts_over() {
    let store = store();
    store.set(keys::CHAT_DRAFT, json!({"not": "a conversation"})).unwrap();

    let gw = gateway("http://127.0.0.1:1");
    let conversation = ChatAssistant::new(&gw, store, None).load().await.unwrap();
    assert_eq!(conversation.messages().len(), 1);
}

/// Clearing resets the draft; logging in drops it
#[tokio::test]
async fn test_clear_and_discard_draft() {
    let store = store();
    let mut old = Conversation::default();
    old.push(Sender::User, "old question");
    store.set_as(keys::CHAT_DRAFT, &old).unwrap();

    let gw = gateway("http://127.0.0.1:1");
    let cleared = ChatAssistant::new(&gw, Arc::clone(&store), None).clear().await.unwrap();
    assert_eq!(cleared.messages().len(), 1);
    let draft: Conversation = store.require(keys::CHAT_DRAFT).unwrap();
    assert_eq!(draft.messages().len(), 1);

    assert!(chat::discard_guest_draft(store.as_ref()).unwrap());
    assert!(store.get(keys::CHAT_DRAFT).unwrap().is_none());
    assert!(!chat::discard_guest_draft(store.as_ref()).unwrap());
}

// =============================================
// Logged in
// =============================================

/// A logged-in user's conversation lives on the service
#[tokio::test]
async fn test_user_conversation_saved_remotely() {
    let mut server = mockito::Server::new_async().await;
    let load = server
        .mock("GET", "/api/chat/get-conversation/asha@example.com")
        .with_status(200)
        .with_body(r#"{"messages":[{"id":1,"text":"Hello","sender":"bot","timestamp":""}]}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/chat/message")
        .with_status(200)
        .with_body(r#"{"response":"Check your blood pressure daily."}"#)
        .create_async()
        .await;
    let save = server
        .mock("POST", "/api/chat/save-conversation")
        .match_body(Matcher::PartialJson(json!({"userEmail": "asha@example.com"})))
        .with_status(200)
        .with_body(r#"{"message":"Conversation saved successfully"}"#)
        .create_async()
        .await;

    let store = store();
    let gw = gateway(&server.url());
    let assistant = ChatAssistant::new(&gw, Arc::clone(&store), Some("asha@example.com"));

    let mut conversation = assistant.load().await.unwrap();
    let reply = assistant.send(&mut conversation, "What should I monitor?").await.unwrap();
    assert_eq!(reply.text, "Check your blood pressure daily.");
    assert_eq!(conversation.messages().len(), 3);
    assert!(store.get(keys::CHAT_DRAFT).unwrap().is_none());

    load.assert_async().await;
    save.assert_async().await;
}

/// An expired session is explained in the conversation and returned
#[tokio::test]
async fn test_expired_session_is_returned() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/chat/message")
        .with_status(401)
        .create_async()
        .await;
    let save = server
        .mock("POST", "/api/chat/save-conversation")
        .with_status(401)
        .create_async()
        .await;

    let gw = gateway(&server.url());
    let assistant = ChatAssistant::new(&gw, store(), Some("u-7"));
    let mut conversation = Conversation::default();

    let err = assistant.send(&mut conversation, "hello").await.unwrap_err();
    assert!(matches!(err, NeoCareError::SessionExpired));
    assert!(conversation.last().unwrap().text.contains("session has expired"));
    save.assert_async().await;
}

//! Seeded application state fixtures

use chrono::Utc;
use std::sync::Arc;

use xfchat::auth::tokens::create_token;
use xfchat::auth::JwtVerifier;
use xfchat::chat::model::{Conversation, ConversationKind};
use xfchat::chat::store::MemoryStore;
use xfchat::server::AppState;

/// Secret shared by the verifier fixture and `token_for`
pub const TEST_SECRET: &str = "xfchat-test-secret";

/// Direct conversation between ALICE and BOB
pub const DIRECT_CONVERSATION: i64 = 42;

/// Project conversation among ALICE, BOB and CAROL
pub const PROJECT_CONVERSATION: i64 = 77;

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const CAROL: i64 = 3;

/// Outsider user, not a participant of any seeded conversation
pub const MALLORY: i64 = 9;

/// Build an `AppState` over a seeded in-memory store
///
/// The returned store handle is the same instance the state uses, so
/// tests can seed history or inspect persistence directly.
pub fn seeded_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.insert_conversation(
        Conversation::new(
            DIRECT_CONVERSATION,
            ConversationKind::Direct,
            [ALICE, BOB],
            Utc::now(),
            Utc::now(),
        )
        .unwrap(),
    );
    store.insert_conversation(
        Conversation::new(
            PROJECT_CONVERSATION,
            ConversationKind::Project,
            [ALICE, BOB, CAROL],
            Utc::now(),
            Utc::now(),
        )
        .unwrap(),
    );
    let state = AppState::new(store.clone(), Arc::new(JwtVerifier::new(TEST_SECRET)));
    (state, store)
}

/// Mint a valid connection token for a seeded user
pub fn token_for(user_id: i64) -> String {
    let username = match user_id {
        ALICE => "alice",
        BOB => "bob",
        CAROL => "carol",
        MALLORY => "mallory",
        _ => "user",
    };
    create_token(user_id, username, TEST_SECRET).expect("failed to mint test token")
}

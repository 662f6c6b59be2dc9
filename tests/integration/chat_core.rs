//! Integration tests for the chat core
//!
//! These drive the frame dispatch path directly against the registry,
//! broadcaster and in-memory store, without a network layer.

use serde_json::json;

use xfchat::auth::Identity;
use xfchat::chat::handler::handle_text;
use xfchat::chat::protocol::{PresenceStatus, ServerFrame};
use xfchat::chat::store::ConversationStore;
use xfchat::chat::registry::SocketHandle;

use crate::common::*;

fn identity(user_id: i64, username: &str) -> Identity {
    Identity {
        user_id,
        username: username.to_string(),
    }
}

#[tokio::test]
async fn test_group_fan_out_excludes_only_the_sender() {
    let (state, _store) = seeded_state();
    let (alice_socket, mut alice_rx) = SocketHandle::channel();
    let (bob_socket, mut bob_rx) = SocketHandle::channel();
    let (carol_socket, mut carol_rx) = SocketHandle::channel();
    state.registry.register(PROJECT_CONVERSATION, ALICE, alice_socket);
    state.registry.register(PROJECT_CONVERSATION, BOB, bob_socket);
    state.registry.register(PROJECT_CONVERSATION, CAROL, carol_socket);

    handle_text(
        &state,
        PROJECT_CONVERSATION,
        &identity(ALICE, "alice"),
        &json!({"type": "message", "content": "team update"}).to_string(),
    )
    .await
    .unwrap();

    for rx in [&mut bob_rx, &mut carol_rx] {
        match rx.try_recv().unwrap() {
            ServerFrame::Message { content, sender_id, .. } => {
                assert_eq!(content, "team update");
                assert_eq!(sender_id, ALICE);
            }
            other => panic!("expected message frame, got {:?}", other),
        }
    }
    assert!(alice_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_messages_from_one_sender_keep_order() {
    let (state, store) = seeded_state();
    let (bob_socket, mut bob_rx) = SocketHandle::channel();
    state.registry.register(DIRECT_CONVERSATION, BOB, bob_socket);

    for content in ["one", "two", "three"] {
        handle_text(
            &state,
            DIRECT_CONVERSATION,
            &identity(ALICE, "alice"),
            &json!({"type": "message", "content": content}).to_string(),
        )
        .await
        .unwrap();
    }

    // Store ids are strictly increasing and delivery follows store order.
    let mut last_id = 0;
    for expected in ["one", "two", "three"] {
        match bob_rx.try_recv().unwrap() {
            ServerFrame::Message { id, content, .. } => {
                assert_eq!(content, expected);
                assert!(id > last_id);
                last_id = id;
            }
            other => panic!("expected message frame, got {:?}", other),
        }
    }
    assert_eq!(store.message_count(), 3);
}

#[tokio::test]
async fn test_dead_socket_is_reaped_on_broadcast() {
    let (state, _store) = seeded_state();
    let (alice_socket, mut alice_rx) = SocketHandle::channel();
    let (bob_socket, bob_rx) = SocketHandle::channel();
    state.registry.register(DIRECT_CONVERSATION, ALICE, alice_socket);
    state.registry.register(DIRECT_CONVERSATION, BOB, bob_socket);

    // Bob's receiver is gone; the next delivery attempt notices.
    drop(bob_rx);

    handle_text(
        &state,
        DIRECT_CONVERSATION,
        &identity(ALICE, "alice"),
        &json!({"type": "message", "content": "anyone there?"}).to_string(),
    )
    .await
    .unwrap();

    assert!(!state.registry.is_user_online_anywhere(BOB));
    assert_eq!(state.presence.status(BOB), PresenceStatus::Offline);

    // Alice hears that Bob dropped offline.
    let mut saw_offline = false;
    while let Ok(frame) = alice_rx.try_recv() {
        if let ServerFrame::Status { user_id, status, .. } = frame {
            if user_id == BOB && status == PresenceStatus::Offline {
                saw_offline = true;
            }
        }
    }
    assert!(saw_offline);
}

#[tokio::test]
async fn test_group_read_receipt_reaches_all_other_participants() {
    let (state, store) = seeded_state();
    let sent = store
        .save_message(PROJECT_CONVERSATION, ALICE, "read me", None)
        .await
        .unwrap();
    let (alice_socket, mut alice_rx) = SocketHandle::channel();
    let (bob_socket, mut bob_rx) = SocketHandle::channel();
    state.registry.register(PROJECT_CONVERSATION, ALICE, alice_socket);
    state.registry.register(PROJECT_CONVERSATION, BOB, bob_socket);

    handle_text(
        &state,
        PROJECT_CONVERSATION,
        &identity(CAROL, "carol"),
        &json!({"type": "read_receipt"}).to_string(),
    )
    .await
    .unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        match rx.try_recv().unwrap() {
            ServerFrame::Read {
                user_id,
                message_ids,
                conversation_id,
            } => {
                assert_eq!(user_id, CAROL);
                assert_eq!(message_ids, vec![sent.id]);
                assert_eq!(conversation_id, PROJECT_CONVERSATION);
            }
            other => panic!("expected read frame, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_presence_is_per_user_not_per_socket() {
    let (state, _store) = seeded_state();
    assert_eq!(state.presence.status(BOB), PresenceStatus::Offline);

    let (tab1, _rx1) = SocketHandle::channel();
    let (tab2, _rx2) = SocketHandle::channel();
    let first = state.registry.register(DIRECT_CONVERSATION, BOB, tab1.clone());
    let second = state.registry.register(DIRECT_CONVERSATION, BOB, tab2.clone());
    assert!(first);
    assert!(!second);
    assert_eq!(state.presence.status(BOB), PresenceStatus::Online);

    let last = state.registry.unregister(DIRECT_CONVERSATION, BOB, &tab1);
    assert!(!last);
    assert_eq!(state.presence.status(BOB), PresenceStatus::Online);

    let last = state.registry.unregister(DIRECT_CONVERSATION, BOB, &tab2);
    assert!(last);
    assert_eq!(state.presence.status(BOB), PresenceStatus::Offline);
}

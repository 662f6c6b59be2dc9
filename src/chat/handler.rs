/**
 * Chat Connection Handler
 *
 * Owns one WebSocket's lifecycle on `GET /ws/chat/{conversation_id}`:
 *
 * ```text
 * CONNECTING -> AUTHENTICATING -> AUTHORIZING -> ACTIVE -> CLOSING -> CLOSED
 * ```
 *
 * - **AUTHENTICATING**: the credential (bearer header or `token` query
 *   parameter) is resolved through the token verifier. Failure closes the
 *   socket with code 1008 before any registry state exists.
 * - **AUTHORIZING**: membership is checked once, at connect time, against
 *   the conversation entity from the store. Failure closes with 1003.
 * - **ACTIVE**: the connection registers with the session registry,
 *   announces presence, replays recent history to the new socket, then
 *   pumps inbound frames serially. One frame is processed to completion,
 *   including persistence, before the next is read, which preserves
 *   per-sender ordering. A malformed frame is logged and dropped; a store
 *   failure abandons that frame's side effects; neither closes the
 *   connection.
 * - **CLOSING**: on transport disconnect the socket is unregistered and,
 *   if it was the user's last in the room, an offline status goes out
 *   best-effort.
 *
 * Outbound traffic flows through a per-connection mpsc queue drained by a
 * writer task, so broadcasts from other connections never block on this
 * socket's I/O. Closing cancels only the inbound read; a persist already
 * started for an accepted frame runs to completion first because the loop
 * awaits it before polling the socket again.
 */

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::auth::{extract_credential, AuthError, Identity};
use crate::chat::model::MediaDescriptor;
use crate::chat::protocol::{ClientFrame, PresenceStatus, ServerFrame};
use crate::chat::registry::SocketHandle;
use crate::chat::ConversationId;
use crate::error::ChatError;
use crate::server::state::AppState;

/// How much history a freshly connected socket gets replayed
const BACKFILL_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Credential fallback for clients that cannot set headers
    pub token: Option<String>,
}

/// Upgrade handler for `GET /ws/chat/{conversation_id}`
///
/// The credential is captured before the upgrade; authentication and
/// authorization run on the upgraded socket so rejections can carry
/// their close codes instead of plain HTTP statuses.
pub async fn chat_ws_upgrade(
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = extract_credential(&headers, query.token.as_deref());
    ws.on_upgrade(move |socket| handle_socket(state, conversation_id, credential, socket))
}

async fn handle_socket(
    state: AppState,
    conversation_id: ConversationId,
    credential: Option<String>,
    mut socket: WebSocket,
) {
    // AUTHENTICATING
    let identity = match authenticate(&state, credential.as_deref()).await {
        Ok(identity) => identity,
        Err(error) => {
            tracing::warn!(conversation_id, %error, "rejecting connection");
            close(&mut socket, &error).await;
            return;
        }
    };

    // AUTHORIZING
    if let Err(error) = authorize(&state, conversation_id, &identity).await {
        tracing::warn!(
            conversation_id,
            user_id = identity.user_id,
            %error,
            "rejecting connection"
        );
        close(&mut socket, &error).await;
        return;
    }

    // ACTIVE
    let (socket_tx, socket_rx) = socket.split();
    let (handle, outbound_rx) = SocketHandle::channel();
    let writer = tokio::spawn(write_loop(socket_tx, outbound_rx));

    let first_for_user = state
        .registry
        .register(conversation_id, identity.user_id, handle.clone());
    tracing::info!(
        conversation_id,
        user_id = identity.user_id,
        socket_id = %handle.id(),
        "chat connection established"
    );
    if first_for_user {
        state.broadcaster.broadcast(
            conversation_id,
            ServerFrame::status(identity.user_id, PresenceStatus::Online),
            Some(identity.user_id),
        );
    }

    backfill(&state, conversation_id, &identity, &handle).await;

    read_loop(&state, conversation_id, &identity, socket_rx).await;

    // CLOSING
    let left_room = state
        .registry
        .unregister(conversation_id, identity.user_id, &handle);
    drop(handle); // last sender gone, writer drains and exits
    tracing::info!(
        conversation_id,
        user_id = identity.user_id,
        "chat connection closed"
    );
    if left_room {
        // Best-effort: the departing connection is already gone, failures
        // here are swallowed by the broadcaster.
        state.broadcaster.broadcast(
            conversation_id,
            ServerFrame::status(identity.user_id, PresenceStatus::Offline),
            Some(identity.user_id),
        );
    }
    let _ = writer.await;
}

async fn authenticate(state: &AppState, credential: Option<&str>) -> Result<Identity, ChatError> {
    let credential = credential.ok_or(AuthError::MissingCredential)?;
    Ok(state.verifier.resolve_identity(credential).await?)
}

/// Membership check, once per connection, against the conversation entity
async fn authorize(
    state: &AppState,
    conversation_id: ConversationId,
    identity: &Identity,
) -> Result<(), ChatError> {
    let forbidden = ChatError::Forbidden {
        conversation_id,
        user_id: identity.user_id,
    };
    let conversation = state
        .store
        .get_conversation(conversation_id)
        .await?
        .ok_or(forbidden)?;
    if conversation.is_participant(identity.user_id) {
        Ok(())
    } else {
        Err(ChatError::Forbidden {
            conversation_id,
            user_id: identity.user_id,
        })
    }
}

async fn close(socket: &mut WebSocket, error: &ChatError) {
    if let Some(code) = error.close_code() {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: "connection rejected".into(),
            })))
            .await;
    } else {
        let _ = socket.send(Message::Close(None)).await;
    }
}

/// Replay recent history to the new socket, oldest first
///
/// `is_self` is computed per message here; live broadcasts never reach
/// the sender, so this is the only place it can be true.
async fn backfill(
    state: &AppState,
    conversation_id: ConversationId,
    identity: &Identity,
    handle: &SocketHandle,
) {
    match state
        .store
        .list_recent_messages(conversation_id, None, BACKFILL_LIMIT)
        .await
    {
        Ok(recent) => {
            for message in recent.into_iter().rev() {
                let is_self = message.sender_id == identity.user_id;
                if handle.send(ServerFrame::from_message(&message, is_self)).is_err() {
                    break;
                }
            }
        }
        Err(error) => {
            tracing::warn!(
                conversation_id,
                user_id = identity.user_id,
                %error,
                "history backfill skipped"
            );
        }
    }
}

/// Serial inbound pump: one frame to completion before the next is read
async fn read_loop(
    state: &AppState,
    conversation_id: ConversationId,
    identity: &Identity,
    mut socket_rx: SplitStream<WebSocket>,
) {
    while let Some(message) = socket_rx.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Err(error) = handle_text(state, conversation_id, identity, &text).await {
                    match &error {
                        ChatError::MalformedFrame { .. } => {
                            tracing::warn!(
                                conversation_id,
                                user_id = identity.user_id,
                                %error,
                                "dropping inbound frame"
                            );
                        }
                        ChatError::Store(_) => {
                            tracing::error!(
                                conversation_id,
                                user_id = identity.user_id,
                                %error,
                                "persistence failed, frame side effects abandoned"
                            );
                        }
                        _ => {
                            tracing::warn!(
                                conversation_id,
                                user_id = identity.user_id,
                                %error,
                                "inbound frame failed"
                            );
                        }
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            // Ping/pong are answered at the transport layer; binary frames
            // are not part of the protocol.
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(
                    conversation_id,
                    user_id = identity.user_id,
                    %error,
                    "socket error, closing"
                );
                break;
            }
        }
    }
}

async fn write_loop(
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerFrame>,
) {
    while let Some(frame) = outbound_rx.recv().await {
        let payload = match serde_json::to_string(&frame) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "failed to serialize outbound frame");
                continue;
            }
        };
        if socket_tx.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }
    let _ = socket_tx.send(Message::Close(None)).await;
}

/// Parse and dispatch one inbound text payload
pub async fn handle_text(
    state: &AppState,
    conversation_id: ConversationId,
    identity: &Identity,
    text: &str,
) -> Result<(), ChatError> {
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|error| ChatError::malformed(error.to_string()))?;
    process_frame(state, conversation_id, identity, frame).await
}

/// Dispatch one validated inbound frame
pub async fn process_frame(
    state: &AppState,
    conversation_id: ConversationId,
    identity: &Identity,
    frame: ClientFrame,
) -> Result<(), ChatError> {
    match frame {
        ClientFrame::Message {
            content,
            media_url,
            media_type,
            media_name,
        } => {
            let media = media_url.map(|url| MediaDescriptor {
                url,
                mime_type: media_type,
                name: media_name,
            });
            if content.trim().is_empty() && media.is_none() {
                return Err(ChatError::malformed(
                    "message requires text content or an attached media descriptor",
                ));
            }

            // Persist first; never broadcast content that could vanish
            // from history on reload.
            let saved = state
                .store
                .save_message(conversation_id, identity.user_id, &content, media)
                .await?;
            let delivered = state.broadcaster.broadcast(
                conversation_id,
                ServerFrame::from_message(&saved, false),
                Some(identity.user_id),
            );
            tracing::debug!(
                conversation_id,
                message_id = saved.id,
                delivered,
                "message persisted and broadcast"
            );
            Ok(())
        }
        ClientFrame::Typing { is_typing } => {
            // Fire-and-forget, nothing persisted.
            state.broadcaster.broadcast(
                conversation_id,
                ServerFrame::Typing {
                    user_id: identity.user_id,
                    username: identity.username.clone(),
                    is_typing,
                    conversation_id,
                },
                Some(identity.user_id),
            );
            Ok(())
        }
        ClientFrame::ReadReceipt { message_ids } => {
            let updated = state
                .store
                .mark_read(conversation_id, identity.user_id, message_ids.as_deref())
                .await?;
            if !updated.is_empty() {
                state.broadcaster.broadcast(
                    conversation_id,
                    ServerFrame::Read {
                        user_id: identity.user_id,
                        message_ids: updated,
                        conversation_id,
                    },
                    Some(identity.user_id),
                );
            }
            Ok(())
        }
    }
}

/**
 * Session Registry
 *
 * Authoritative in-memory map of which user sockets are attached to which
 * conversation. This is the one piece of shared mutable state in the chat
 * core; every mutation and every read-for-broadcast goes through it.
 *
 * # Keying
 *
 * Sockets are bucketed under `(conversation_id, user_id)`. A user may hold
 * several simultaneous sockets in the same conversation (multiple tabs or
 * devices), so each bucket is a set of handles rather than a single slot.
 *
 * # Snapshots
 *
 * `sockets_in` returns a copied snapshot, never a live view, so broadcast
 * loops cannot observe concurrent mutation mid-iteration.
 *
 * # Lifecycle
 *
 * State is process-memory only and lost on restart. Presence is inherently
 * ephemeral, so nothing here is persisted. Empty buckets are pruned
 * immediately on unregister so the maps never leak empty sets.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chat::protocol::ServerFrame;
use crate::chat::{ConversationId, UserId};
use crate::error::ChatError;

/// Handle to one live socket's outbound queue
///
/// Frames pushed here are drained by the connection's writer task and sent
/// over the wire. The push itself never blocks, so a slow peer cannot stall
/// a broadcast; it fails only once the connection's writer has shut down,
/// which is how dead connections are detected and reaped.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    id: Uuid,
    sender: mpsc::UnboundedSender<ServerFrame>,
}

impl SocketHandle {
    pub fn new(sender: mpsc::UnboundedSender<ServerFrame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }

    /// Create a handle together with the receiving end of its queue
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a frame for delivery on this socket
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Delivery` when the connection's writer task has
    /// already terminated.
    pub fn send(&self, frame: ServerFrame) -> Result<(), ChatError> {
        self.sender
            .send(frame)
            .map_err(|_| ChatError::Delivery { socket_id: self.id })
    }
}

impl PartialEq for SocketHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SocketHandle {}

type Buckets = HashMap<ConversationId, HashMap<UserId, Vec<SocketHandle>>>;

/// In-memory registry of active chat sessions
///
/// Cloning is cheap; all clones share the same underlying map. The interior
/// mutex is held only for map manipulation, never across I/O.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    buckets: Arc<Mutex<Buckets>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a socket under `(conversation_id, user_id)`
    ///
    /// Idempotent: registering the same handle twice leaves one entry.
    /// Returns `true` when this is the user's first socket in the
    /// conversation, i.e. the user just came online in this room.
    pub fn register(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        socket: SocketHandle,
    ) -> bool {
        let mut buckets = self.buckets.lock().expect("session registry poisoned");
        let sockets = buckets
            .entry(conversation_id)
            .or_default()
            .entry(user_id)
            .or_default();
        let first_for_user = sockets.is_empty();
        if !sockets.contains(&socket) {
            sockets.push(socket);
        }
        first_for_user
    }

    /// Remove exactly this socket from its bucket
    ///
    /// Safe to call for a socket that is not registered; disconnect paths
    /// may race and the second call is a no-op. Returns `true` when the
    /// removed socket was the user's last in the conversation, i.e. the
    /// user just left the room.
    pub fn unregister(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        socket: &SocketHandle,
    ) -> bool {
        let mut buckets = self.buckets.lock().expect("session registry poisoned");
        let Some(users) = buckets.get_mut(&conversation_id) else {
            return false;
        };
        let Some(sockets) = users.get_mut(&user_id) else {
            return false;
        };
        let before = sockets.len();
        sockets.retain(|candidate| candidate != socket);
        let removed = sockets.len() < before;
        let last_for_user = removed && sockets.is_empty();

        // Prune empty buckets immediately.
        if sockets.is_empty() {
            users.remove(&user_id);
        }
        if users.is_empty() {
            buckets.remove(&conversation_id);
        }
        last_for_user
    }

    /// Snapshot of every socket currently attached to a conversation
    pub fn sockets_in(&self, conversation_id: ConversationId) -> Vec<(UserId, SocketHandle)> {
        let buckets = self.buckets.lock().expect("session registry poisoned");
        buckets
            .get(&conversation_id)
            .map(|users| {
                users
                    .iter()
                    .flat_map(|(user_id, sockets)| {
                        sockets.iter().map(|socket| (*user_id, socket.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the user holds at least one socket in any conversation
    pub fn is_user_online_anywhere(&self, user_id: UserId) -> bool {
        let buckets = self.buckets.lock().expect("session registry poisoned");
        buckets.values().any(|users| users.contains_key(&user_id))
    }
}

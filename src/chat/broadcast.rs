/**
 * Fan-out Broadcaster
 *
 * Delivers one event to every currently-connected participant of a
 * conversation, with best-effort semantics.
 *
 * # Delivery
 *
 * Delivery iterates a registry snapshot, so sockets registered or removed
 * mid-broadcast are simply not part of this fan-out. A failure on one
 * socket never aborts delivery to the others.
 *
 * # Reaping
 *
 * A failed send means the connection's writer task is gone. The socket is
 * unregistered on the spot and, when it was the user's last socket in the
 * room, an "offline" status is announced to the remaining participants.
 * Dead connections are reaped opportunistically this way instead of via a
 * separate heartbeat sweep.
 *
 * # Ordering
 *
 * Sends are non-blocking pushes into per-socket queues, performed inline
 * in the caller's task. Two broadcasts issued in order by one connection's
 * serial event loop are therefore enqueued in that order on every shared
 * recipient; the broadcaster never reorders events for a conversation.
 * No ordering is promised across different recipients.
 */

use std::collections::VecDeque;

use crate::chat::protocol::{PresenceStatus, ServerFrame};
use crate::chat::registry::{SessionRegistry, SocketHandle};
use crate::chat::{ConversationId, UserId};

#[derive(Clone)]
pub struct Broadcaster {
    registry: SessionRegistry,
}

impl Broadcaster {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Deliver `frame` to every socket in the conversation
    ///
    /// Sockets owned by `exclude_user` are skipped entirely, covering all
    /// of that user's tabs and devices. Returns the number of sockets the
    /// frame was queued on; zero recipients is not an error.
    pub fn broadcast(
        &self,
        conversation_id: ConversationId,
        frame: ServerFrame,
        exclude_user: Option<UserId>,
    ) -> usize {
        let (delivered, failed) = self.deliver(conversation_id, &frame, exclude_user);
        if delivered == 0 {
            tracing::debug!(conversation_id, "no recipients for broadcast");
        }
        self.reap(conversation_id, failed);
        delivered
    }

    /// One pass over the snapshot; failures are collected, not retried
    fn deliver(
        &self,
        conversation_id: ConversationId,
        frame: &ServerFrame,
        exclude_user: Option<UserId>,
    ) -> (usize, Vec<(UserId, SocketHandle)>) {
        let mut delivered = 0;
        let mut failed = Vec::new();
        for (user_id, socket) in self.registry.sockets_in(conversation_id) {
            if exclude_user == Some(user_id) {
                continue;
            }
            match socket.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        conversation_id,
                        user_id,
                        socket_id = %socket.id(),
                        %error,
                        "dropping dead socket during broadcast"
                    );
                    failed.push((user_id, socket));
                }
            }
        }
        (delivered, failed)
    }

    /// Unregister dead sockets and announce departures
    ///
    /// Offline announcements can themselves hit further dead sockets, so
    /// this drains a worklist. Each socket fails at most once before it is
    /// out of every snapshot, which bounds the loop.
    fn reap(&self, conversation_id: ConversationId, failed: Vec<(UserId, SocketHandle)>) {
        let mut queue: VecDeque<(UserId, SocketHandle)> = failed.into();
        while let Some((user_id, socket)) = queue.pop_front() {
            if self.registry.unregister(conversation_id, user_id, &socket) {
                let offline = ServerFrame::status(user_id, PresenceStatus::Offline);
                let (_, more_failed) =
                    self.deliver(conversation_id, &offline, Some(user_id));
                queue.extend(more_failed);
            }
        }
    }
}

//! Presence Tracker
//!
//! Thin derived view over the session registry. A user is "online" while
//! they hold at least one registered socket anywhere; there is no
//! independent presence state to update or persist.

use crate::chat::protocol::PresenceStatus;
use crate::chat::registry::SessionRegistry;
use crate::chat::UserId;

#[derive(Clone)]
pub struct PresenceTracker {
    registry: SessionRegistry,
}

impl PresenceTracker {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Current status derived from active sessions
    pub fn status(&self, user_id: UserId) -> PresenceStatus {
        if self.registry.is_user_online_anywhere(user_id) {
            PresenceStatus::Online
        } else {
            PresenceStatus::Offline
        }
    }
}

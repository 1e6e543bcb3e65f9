//! Registry of realtime subscribers grouped by session id.

use actix::prelude::*;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// One serialized event, shared across every subscriber send.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct SessionBroadcast {
    pub payload: Arc<String>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, DashMap<Uuid, Recipient<SessionBroadcast>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn register(&self, session_id: &str, recipient: Recipient<SessionBroadcast>) -> Uuid {
        let token = Uuid::new_v4();
        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_default();
        entry.insert(token, recipient);
        info!(
            session_id = %session_id,
            subscribers = entry.len(),
            "realtime subscriber connected"
        );
        token
    }

    pub fn unregister(&self, session_id: &str, token: Uuid) {
        let mut drop_entry = false;
        if let Some(entry) = self.sessions.get(session_id) {
            entry.remove(&token);
            drop_entry = entry.is_empty();
        }
        // The guard must be released before touching the outer map.
        if drop_entry {
            self.sessions
                .remove_if(session_id, |_, subscribers| subscribers.is_empty());
            info!(session_id = %session_id, "all realtime subscribers disconnected");
        }
    }

    /// Deliver one message to every subscriber of a session. A subscriber
    /// whose mailbox rejects the send is treated as disconnected and
    /// removed; the broadcast itself never fails.
    pub fn broadcast(&self, session_id: &str, message: SessionBroadcast) {
        let dead: Vec<Uuid> = match self.sessions.get(session_id) {
            None => return,
            Some(entry) => entry
                .iter()
                .filter_map(|subscriber| {
                    subscriber
                        .value()
                        .try_send(message.clone())
                        .err()
                        .map(|_| *subscriber.key())
                })
                .collect(),
        };

        for token in dead {
            self.unregister(session_id, token);
        }
    }

    pub fn connection_count(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }
}

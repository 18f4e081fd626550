// Hivetrap Engine — Session Store
//
// In-memory conversation tracking, one `Session` per counterpart.
// Exclusively owns every session: callers read history and append
// through these methods only. A session is created lazily on the first
// message for its id and removed only by a bulk reset.
//
// `append_exchange` is the single mutator of `messages` — it records
// the scammer line and the assistant reply it provoked together, so
// history never loses the correlation between the two.

use crate::atoms::types::{MessageSender, Session, SessionMessage, Source};
use chrono::Utc;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session for `id`, creating it if this is the first
    /// message of the conversation. Never overwrites an existing
    /// session: `source` and `start_time` stick from the first call.
    pub fn get_or_create(&self, id: &str, source: Source) -> Session {
        let mut sessions = self.sessions.lock();
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("[sessions] New session {} on {}", id, source);
                Session {
                    id: id.to_string(),
                    source,
                    messages: Vec::new(),
                    start_time: Utc::now(),
                }
            })
            .clone()
    }

    /// Append one completed round-trip: the incoming scammer message and
    /// the assistant reply it provoked, in that order.
    pub fn append_exchange(&self, id: &str, incoming: &str, reply: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(id) {
            session
                .messages
                .push(SessionMessage::now(MessageSender::Scammer, incoming));
            session
                .messages
                .push(SessionMessage::now(MessageSender::Assistant, reply));
        }
    }

    /// Ordered message history for a session. Empty if the id is unknown.
    pub fn history(&self, id: &str) -> Vec<SessionMessage> {
        self.sessions
            .lock()
            .get(id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Full copy of every session, keyed by id (snapshot persistence).
    pub fn snapshot(&self) -> HashMap<String, Session> {
        self.sessions.lock().clone()
    }

    /// Replace all sessions (snapshot restore at startup).
    pub fn restore(&self, sessions: HashMap<String, Session>) {
        *self.sessions.lock() = sessions;
    }

    /// Drop every session (bulk reset).
    pub fn clear(&self) {
        self.sessions.lock().clear();
    }
}

// Hivetrap Engine — Core types
// These are the data structures that flow through the entire engine.
// They are independent of any specific messaging platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Limits ─────────────────────────────────────────────────────────────

/// Pipeline refuses messages longer than this (characters).
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Alert text is truncated to this many characters before storage.
pub const ALERT_TEXT_CHARS: usize = 100;

/// The alert buffer never holds more than this many entries.
pub const ALERT_BUFFER_CAP: usize = 50;

/// `get_stats` returns at most this many recent alerts.
pub const STATS_RECENT_ALERTS: usize = 10;

// ── Channel source ─────────────────────────────────────────────────────

/// Which messaging surface a message was observed on.
/// `Manual` is for ad hoc analysis (e.g. user-selected text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    WhatsApp,
    Gmail,
    Messenger,
    Telegram,
    Manual,
    Unknown,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::WhatsApp => "WhatsApp",
            Source::Gmail => "Gmail",
            Source::Messenger => "Messenger",
            Source::Telegram => "Telegram",
            Source::Manual => "Manual",
            Source::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Session messages ───────────────────────────────────────────────────

/// Who authored a line in a tracked conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Scammer,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub sender: MessageSender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl SessionMessage {
    pub fn now(sender: MessageSender, text: impl Into<String>) -> Self {
        SessionMessage {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One tracked conversation with a counterpart.
/// Created lazily on first message, never deleted except by a bulk reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub source: Source,
    pub messages: Vec<SessionMessage>,
    pub start_time: DateTime<Utc>,
}

// ── Alerts ─────────────────────────────────────────────────────────────

/// Immutable record of one detected scam event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// First 100 characters of the message, with "..." if truncated.
    pub text: String,
    pub source: Source,
    pub timestamp: DateTime<Utc>,
    /// The engagement reply the verdict carried, if any.
    pub reply: Option<String>,
}

impl Alert {
    pub fn new(message_text: &str, source: Source, reply: Option<String>) -> Self {
        Alert {
            text: truncate_with_ellipsis(message_text, ALERT_TEXT_CHARS),
            source,
            timestamp: Utc::now(),
            reply,
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Truncate to at most `max_chars` characters on a char boundary,
/// appending "..." when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate_with_ellipsis("hello", 100), "hello");
    }

    #[test]
    fn long_text_gets_marker() {
        let long = "x".repeat(150);
        let t = truncate_with_ellipsis(&long, 100);
        assert_eq!(t.chars().count(), 103);
        assert!(t.ends_with("..."));
    }

    #[test]
    fn truncation_is_char_safe() {
        let text = "नमस्ते".repeat(40);
        let t = truncate_with_ellipsis(&text, 100);
        assert!(t.ends_with("..."));
        // Must not panic or split a multi-byte char
        assert_eq!(t.chars().count(), 103);
    }
}

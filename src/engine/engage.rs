// Hivetrap Engine — Engagement Scheduler
//
// Turns a scam verdict into a delayed auto-reply that keeps the
// counterpart talking. The reply goes out through a platform-supplied
// `SendAdapter` after a randomized 2–5 s delay; an instant reply cadence
// would read as a bot.
//
// One shot per verdict: a failed send is logged by the adapter layer and
// never retried. Two pipeline invocations for different messages in the
// same session may legitimately schedule two replies — that matches
// natural conversational cadence.

use crate::atoms::error::EngineResult;
use crate::engine::classifier::ScamVerdict;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Reply delay window, milliseconds (inclusive).
const DELAY_MIN_MS: u64 = 2000;
const DELAY_MAX_MS: u64 = 5000;

// ── Send adapter contract ──────────────────────────────────────────────

/// Platform-specific message delivery, supplied by the environment.
/// The engine is agnostic to how a send is actually performed.
#[async_trait]
pub trait SendAdapter: Send + Sync {
    async fn send(&self, text: &str) -> EngineResult<()>;
}

// ── Scheduling state ───────────────────────────────────────────────────

/// What the scheduler remembers about the latest engagement per session.
/// Separate from the Session Store — this is scheduling bookkeeping,
/// not conversation history.
#[derive(Debug, Clone)]
pub struct EngagementRecord {
    pub last_message: String,
    pub last_reply: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct EngagementScheduler {
    records: Mutex<HashMap<String, EngagementRecord>>,
}

/// Uniform random delay in [2000, 5000] ms.
fn pick_delay() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(DELAY_MIN_MS..=DELAY_MAX_MS))
}

impl EngagementScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an engagement reply if the verdict calls for one and
    /// auto-engage is enabled. Returns the handle of the spawned send
    /// task so a caller could cancel a pending reply; dropping the
    /// handle detaches the task.
    pub fn maybe_engage(
        &self,
        verdict: &ScamVerdict,
        session_id: &str,
        last_message: &str,
        adapter: Arc<dyn SendAdapter>,
        auto_engage: bool,
    ) -> Option<JoinHandle<()>> {
        if !auto_engage || !verdict.is_scam() {
            return None;
        }
        let reply = verdict.reply()?.to_string();

        self.records.lock().insert(
            session_id.to_string(),
            EngagementRecord {
                last_message: last_message.to_string(),
                last_reply: reply.clone(),
                timestamp: Utc::now(),
            },
        );

        let delay = pick_delay();
        let session_id = session_id.to_string();
        debug!(
            "[engage] Reply for session {} scheduled in {}ms",
            session_id,
            delay.as_millis()
        );

        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match adapter.send(&reply).await {
                Ok(()) => info!("[engage] Reply sent for session {}", session_id),
                // One shot; a failed send is not retried.
                Err(e) => warn!("[engage] Send failed for session {}: {}", session_id, e),
            }
        }))
    }

    /// Latest scheduling record for a session, if any.
    pub fn record_for(&self, session_id: &str) -> Option<EngagementRecord> {
        self.records.lock().get(session_id).cloned()
    }

    /// Drop all scheduling records (bulk reset).
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::RemoteVerdict;
    use crate::engine::detector::classify_locally;

    struct RecordingAdapter {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingAdapter {
        fn new() -> Arc<Self> {
            Arc::new(RecordingAdapter {
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SendAdapter for RecordingAdapter {
        async fn send(&self, text: &str) -> EngineResult<()> {
            self.sent.lock().push(text.to_string());
            Ok(())
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl SendAdapter for FailingAdapter {
        async fn send(&self, _text: &str) -> EngineResult<()> {
            Err("input box not found".into())
        }
    }

    fn scam_verdict() -> ScamVerdict {
        ScamVerdict::Remote(RemoteVerdict {
            reply: "oh no, what do I do?".into(),
        })
    }

    #[test]
    fn delay_stays_in_window() {
        for _ in 0..500 {
            let d = pick_delay().as_millis() as u64;
            assert!((DELAY_MIN_MS..=DELAY_MAX_MS).contains(&d), "delay {} out of range", d);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn engages_and_sends_after_delay() {
        let scheduler = EngagementScheduler::new();
        let adapter = RecordingAdapter::new();

        let handle = scheduler
            .maybe_engage(&scam_verdict(), "s1", "send the otp", adapter.clone(), true)
            .expect("should schedule");
        handle.await.unwrap();

        assert_eq!(adapter.sent.lock().as_slice(), ["oh no, what do I do?"]);
        let record = scheduler.record_for("s1").unwrap();
        assert_eq!(record.last_message, "send the otp");
        assert_eq!(record.last_reply, "oh no, what do I do?");
    }

    #[tokio::test]
    async fn disabled_flag_schedules_nothing() {
        let scheduler = EngagementScheduler::new();
        let adapter = RecordingAdapter::new();
        let handle =
            scheduler.maybe_engage(&scam_verdict(), "s1", "send the otp", adapter.clone(), false);
        assert!(handle.is_none());
        assert!(scheduler.record_for("s1").is_none());
    }

    #[tokio::test]
    async fn clean_verdict_schedules_nothing() {
        let scheduler = EngagementScheduler::new();
        let adapter = RecordingAdapter::new();
        let clean = ScamVerdict::Local(classify_locally("lunch tomorrow?"));
        let handle = scheduler.maybe_engage(&clean, "s1", "lunch tomorrow?", adapter, true);
        assert!(handle.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_is_swallowed_not_retried() {
        let scheduler = EngagementScheduler::new();
        let handle = scheduler
            .maybe_engage(&scam_verdict(), "s1", "msg", Arc::new(FailingAdapter), true)
            .expect("should schedule");
        // Task completes despite the failure; the record stays.
        handle.await.unwrap();
        assert!(scheduler.record_for("s1").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn pending_send_can_be_cancelled() {
        let scheduler = EngagementScheduler::new();
        let adapter = RecordingAdapter::new();
        let handle = scheduler
            .maybe_engage(&scam_verdict(), "s1", "msg", adapter.clone(), true)
            .expect("should schedule");
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert!(adapter.sent.lock().is_empty());
    }
}

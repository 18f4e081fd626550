// Hivetrap Engine — Shared engine state
//
// `EngineState` is the explicit context object for one running engine:
// constructed once at process start, passed by reference to every
// component, torn down at shutdown. Nothing in the crate keeps
// module-level mutable state.
//
// When wired to a `KvStore`, the state snapshots itself after each
// mutation and restores at startup. The dedupe index is deliberately
// excluded from the snapshot: it guards re-analysis within one process
// lifetime only.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{Alert, Session, ALERT_BUFFER_CAP, STATS_RECENT_ALERTS};
use crate::engine::dedupe::DedupeIndex;
use crate::engine::intel::{IntelligenceReport, IntelligenceStore};
use crate::engine::sessions::SessionStore;
use crate::engine::storage::KvStore;
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// KV key holding the serialized `EngineConfig`.
pub const CONFIG_KEY: &str = "engine_config";

/// KV key holding the serialized `StateSnapshot`.
pub const STATE_KEY: &str = "engine_state";

// ── Configuration ──────────────────────────────────────────────────────

/// User-controlled engine configuration, loaded from the KV store at
/// startup and updatable at runtime without a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Base endpoint of the remote classifier.
    pub api_base_url: String,
    /// Credential sent in the `X-API-Key` header.
    pub api_key: String,
    /// When true, detected scams get an automatic engagement reply.
    pub auto_engage: bool,
    /// Language tag forwarded as classification metadata.
    pub language: String,
    /// Locale tag forwarded as classification metadata.
    pub locale: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            api_base_url: "http://127.0.0.1:8000".into(),
            api_key: String::new(),
            auto_engage: false,
            language: "English".into(),
            locale: "IN".into(),
        }
    }
}

// ── Alert buffer ───────────────────────────────────────────────────────

/// Bounded buffer of detected-scam alerts, most-recent-first.
/// Inserting beyond the cap evicts the oldest entry.
#[derive(Debug, Default)]
pub struct AlertBuffer {
    inner: Mutex<VecDeque<Alert>>,
}

impl AlertBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, alert: Alert) {
        let mut alerts = self.inner.lock();
        alerts.push_front(alert);
        alerts.truncate(ALERT_BUFFER_CAP);
    }

    /// Up to `n` most recent alerts, newest first.
    pub fn recent(&self, n: usize) -> Vec<Alert> {
        self.inner.lock().iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn snapshot(&self) -> Vec<Alert> {
        self.inner.lock().iter().cloned().collect()
    }

    fn restore(&self, alerts: Vec<Alert>) {
        let mut inner = self.inner.lock();
        *inner = alerts.into_iter().collect();
        inner.truncate(ALERT_BUFFER_CAP);
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }
}

// ── Snapshot & stats ───────────────────────────────────────────────────

/// Everything the engine persists between restarts.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StateSnapshot {
    sessions: HashMap<String, Session>,
    total_scams: u64,
    intelligence: IntelligenceReport,
    recent_alerts: Vec<Alert>,
}

/// Query surface exposed to the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub total_scams: u64,
    pub intelligence: IntelligenceReport,
    pub recent_alerts: Vec<Alert>,
}

// ── Engine state ───────────────────────────────────────────────────────

pub struct EngineState {
    pub sessions: SessionStore,
    pub intelligence: IntelligenceStore,
    pub alerts: AlertBuffer,
    pub dedupe: DedupeIndex,
    config: Mutex<EngineConfig>,
    total_scams: AtomicU64,
    store: Option<Arc<dyn KvStore>>,
    /// Live alert feed for the environment's notification layer.
    alert_tx: broadcast::Sender<Alert>,
}

impl EngineState {
    /// Ephemeral state with default config and no durable store.
    pub fn new() -> Self {
        let (alert_tx, _) = broadcast::channel(64);
        EngineState {
            sessions: SessionStore::new(),
            intelligence: IntelligenceStore::new(),
            alerts: AlertBuffer::new(),
            dedupe: DedupeIndex::new(),
            config: Mutex::new(EngineConfig::default()),
            total_scams: AtomicU64::new(0),
            store: None,
            alert_tx,
        }
    }

    /// State wired to a durable KV store. Restores the saved config and
    /// snapshot; a corrupt saved value falls back to defaults rather
    /// than failing startup.
    pub fn with_store(store: Arc<dyn KvStore>) -> EngineResult<Self> {
        let config = match store.get(CONFIG_KEY)? {
            Some(json) => serde_json::from_str::<EngineConfig>(&json).unwrap_or_default(),
            None => EngineConfig::default(),
        };

        let state = EngineState {
            config: Mutex::new(config),
            store: Some(store.clone()),
            ..EngineState::new()
        };

        if let Some(json) = store.get(STATE_KEY)? {
            match serde_json::from_str::<StateSnapshot>(&json) {
                Ok(snapshot) => {
                    info!(
                        "[state] Restored {} session(s), {} alert(s), {} scam(s) total",
                        snapshot.sessions.len(),
                        snapshot.recent_alerts.len(),
                        snapshot.total_scams
                    );
                    state.sessions.restore(snapshot.sessions);
                    state.intelligence.restore(snapshot.intelligence);
                    state.alerts.restore(snapshot.recent_alerts);
                    state
                        .total_scams
                        .store(snapshot.total_scams, Ordering::Relaxed);
                }
                Err(e) => warn!("[state] Discarding corrupt snapshot: {}", e),
            }
        }

        Ok(state)
    }

    // ── Config ─────────────────────────────────────────────────────────

    /// Current configuration (cloned).
    pub fn config(&self) -> EngineConfig {
        self.config.lock().clone()
    }

    /// Apply a configuration change at runtime and persist it.
    pub fn update_config(&self, config: EngineConfig) -> EngineResult<()> {
        if let Some(store) = &self.store {
            store.set(CONFIG_KEY, &serde_json::to_string(&config)?)?;
        }
        *self.config.lock() = config;
        info!("[state] Config updated");
        Ok(())
    }

    // ── Detection bookkeeping ──────────────────────────────────────────

    /// Record one detected scam: buffer the alert, bump the counter,
    /// and push the alert onto the live feed. The caller persists
    /// afterwards.
    pub fn record_detection(&self, alert: Alert) {
        // A send only fails when nobody is subscribed.
        let _ = self.alert_tx.send(alert.clone());
        self.alerts.push(alert);
        self.total_scams.fetch_add(1, Ordering::Relaxed);
    }

    /// Subscribe to the live alert feed (one `Alert` per detection).
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    pub fn total_scams(&self) -> u64 {
        self.total_scams.load(Ordering::Relaxed)
    }

    // ── Query surface ──────────────────────────────────────────────────

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            total_scams: self.total_scams(),
            intelligence: self.intelligence.report(),
            recent_alerts: self.alerts.recent(STATS_RECENT_ALERTS),
        }
    }

    /// Reset every accumulation structure to empty (sessions,
    /// intelligence, alerts, counter, dedupe index) and persist the
    /// cleared snapshot.
    pub fn clear_data(&self) {
        self.sessions.clear();
        self.intelligence.clear();
        self.alerts.clear();
        self.dedupe.clear();
        self.total_scams.store(0, Ordering::Relaxed);
        self.persist();
        info!("[state] All engine data cleared");
    }

    // ── Persistence ────────────────────────────────────────────────────

    /// Write the current snapshot to the KV store, if one is attached.
    /// Failures degrade durability, not service: logged, never raised.
    pub fn persist(&self) {
        let Some(store) = &self.store else { return };
        let snapshot = StateSnapshot {
            sessions: self.sessions.snapshot(),
            total_scams: self.total_scams(),
            intelligence: self.intelligence.report(),
            recent_alerts: self.alerts.snapshot(),
        };
        let result = serde_json::to_string(&snapshot)
            .map_err(crate::atoms::error::EngineError::from)
            .and_then(|json| store.set(STATE_KEY, &json));
        if let Err(e) = result {
            warn!("[state] Snapshot write failed: {}", e);
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

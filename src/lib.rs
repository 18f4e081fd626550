// Hivetrap — scam honeypot engine
//
// Passively watches text messages from untrusted counterparts, decides
// whether each one is a fraud attempt (fast local heuristic, remote
// classifier with graceful fallback), tracks the conversation, extracts
// reusable threat intelligence, and — when auto-engage is on — schedules
// a delayed reply to keep the scammer talking.
//
// The watcher that observes platform messages, the UI that renders
// alerts, and the mechanics of typing into a target app are all external
// collaborators; this crate is the engine between them.

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{Alert, MessageSender, Session, SessionMessage, Source};
pub use engine::classifier::{AnalyzeOutcome, ClassifierClient, RemoteVerdict, ScamVerdict};
pub use engine::detector::LocalVerdict;
pub use engine::engage::{EngagementScheduler, SendAdapter};
pub use engine::intel::{ExtractedEntities, IntelligenceReport, IntelligenceStore};
pub use engine::pipeline::{MessagePipeline, PipelineOutcome};
pub use engine::sessions::SessionStore;
pub use engine::state::{EngineConfig, EngineState, EngineStats};
pub use engine::storage::{KvStore, MemoryStore, SqliteStore};

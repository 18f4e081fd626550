// Hivetrap Engine — Remote Classifier Client
//
// Orchestration, not classification: resolves the session, submits the
// message plus prior history to the remote classifier, and applies the
// verdict to engine state. A successful remote call is definitionally a
// confirmed scam — the service only ever answers with an engagement
// line, there is no "not a scam" success path.
//
// Every remote failure (network error, non-2xx, malformed body) is one
// uniform condition handled the same way: fall back to the local
// keyword classifier. The caller never sees the degradation as an
// error; recall drops and conversational continuity is lost for that
// exchange, nothing more.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{Alert, MessageSender, SessionMessage, Source};
use crate::engine::detector::{classify_locally, LocalVerdict};
use crate::engine::intel;
use crate::engine::state::{EngineConfig, EngineState};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Verdict ────────────────────────────────────────────────────────────

/// Verdict produced by the remote classifier: the engagement reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteVerdict {
    pub reply: String,
}

/// Classification outcome for one message. The two paths carry
/// different payloads, unified by the accessors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScamVerdict {
    Remote(RemoteVerdict),
    Local(LocalVerdict),
}

impl ScamVerdict {
    pub fn is_scam(&self) -> bool {
        match self {
            ScamVerdict::Remote(_) => true,
            ScamVerdict::Local(v) => v.is_scam,
        }
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            ScamVerdict::Remote(v) => Some(&v.reply),
            ScamVerdict::Local(v) => v.reply.as_deref(),
        }
    }

    /// Diagnostic score from the local fallback. Absent on the remote
    /// path, and intentionally uncapped above 1.0 when present.
    pub fn confidence(&self) -> Option<f32> {
        match self {
            ScamVerdict::Remote(_) => None,
            ScamVerdict::Local(v) => Some(v.confidence),
        }
    }

    pub fn matched_keywords(&self) -> &[String] {
        match self {
            ScamVerdict::Remote(_) => &[],
            ScamVerdict::Local(v) => &v.matched_keywords,
        }
    }
}

/// What `analyze` hands back: the verdict plus the session it landed in.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub session_id: String,
    pub verdict: ScamVerdict,
}

// ── Wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    session_id: &'a str,
    message: &'a SessionMessage,
    conversation_history: &'a [SessionMessage],
    metadata: RequestMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct RequestMetadata<'a> {
    channel: &'a str,
    language: &'a str,
    locale: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    reply: String,
}

// ── Client ─────────────────────────────────────────────────────────────

pub struct ClassifierClient {
    client: reqwest::Client,
}

impl ClassifierClient {
    /// The core imposes no request timeout of its own; the embedding
    /// environment may configure one on its HTTP stack.
    pub fn new() -> Self {
        ClassifierClient {
            client: reqwest::Client::new(),
        }
    }

    /// Classify one message, resolving (or creating) its session and
    /// applying all state effects of the verdict. Empty text is the
    /// only caller-visible error; remote failures degrade silently to
    /// the local fallback.
    pub async fn analyze(
        &self,
        state: &EngineState,
        text: &str,
        source: Source,
        session_id: Option<String>,
    ) -> EngineResult<AnalyzeOutcome> {
        if text.trim().is_empty() {
            return Err(EngineError::invalid_input("message text is empty"));
        }

        let session_id = session_id.unwrap_or_else(generate_session_id);
        let session = state.sessions.get_or_create(&session_id, source);

        // History as it stood before this message arrived.
        let history = session.messages;
        let incoming = SessionMessage::now(MessageSender::Scammer, text);
        let config = state.config();

        let request = AnalyzeRequest {
            session_id: &session_id,
            message: &incoming,
            conversation_history: &history,
            metadata: RequestMetadata {
                channel: source.as_str(),
                language: &config.language,
                locale: &config.locale,
            },
        };

        match self.request_reply(&config, &request).await {
            Ok(reply) => {
                info!("[classifier] Scam confirmed on {} (session {})", source, session_id);
                state.sessions.append_exchange(&session_id, text, &reply);
                state.intelligence.merge(intel::extract(text));
                state.record_detection(Alert::new(text, source, Some(reply.clone())));
                state.persist();
                Ok(AnalyzeOutcome {
                    session_id,
                    verdict: ScamVerdict::Remote(RemoteVerdict { reply }),
                })
            }
            Err(e) => {
                warn!("[classifier] Remote classifier unavailable ({}) — using local fallback", e);
                let verdict = classify_locally(text);
                if verdict.is_scam {
                    // No conversational round-trip happened, so session
                    // history stays untouched.
                    state.intelligence.merge(intel::extract(text));
                    state.record_detection(Alert::new(text, source, verdict.reply.clone()));
                    state.persist();
                } else {
                    debug!("[classifier] Local fallback found nothing in session {}", session_id);
                }
                Ok(AnalyzeOutcome {
                    session_id,
                    verdict: ScamVerdict::Local(verdict),
                })
            }
        }
    }

    async fn request_reply(
        &self,
        config: &EngineConfig,
        request: &AnalyzeRequest<'_>,
    ) -> EngineResult<String> {
        let url = format!(
            "{}/analyze-message",
            config.api_base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .header("X-API-Key", config.api_key.as_str())
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(EngineError::channel(
                "classifier",
                format!("HTTP {}", resp.status()),
            ));
        }

        let data: AnalyzeResponse = resp.json().await?;
        Ok(data.reply)
    }
}

impl Default for ClassifierClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Session id for conversations without a channel-supplied identifier:
/// millisecond timestamp plus a random suffix.
fn generate_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

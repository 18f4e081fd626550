// Hivetrap Engine — Message Pipeline
//
// The entry point the watcher layer drives: one call per observed
// message. The funnel is cheap-first —
//
//   validate → dedupe → local gate → classify (remote or fallback)
//            → record alert/intel → maybe schedule engagement
//
// Everything up to the classifier call is synchronous and pure; only
// the remote request and the engagement timer suspend.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{Source, MAX_MESSAGE_CHARS};
use crate::engine::classifier::{AnalyzeOutcome, ClassifierClient};
use crate::engine::detector;
use crate::engine::engage::{EngagementScheduler, SendAdapter};
use crate::engine::state::EngineState;
use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Result of one pipeline invocation that made it past the gates.
pub struct PipelineOutcome {
    pub analysis: AnalyzeOutcome,
    /// Handle of the scheduled engagement send, when one was queued.
    pub engagement: Option<JoinHandle<()>>,
}

pub struct MessagePipeline {
    state: Arc<EngineState>,
    classifier: ClassifierClient,
    scheduler: EngagementScheduler,
}

impl MessagePipeline {
    pub fn new(state: Arc<EngineState>) -> Self {
        MessagePipeline {
            state,
            classifier: ClassifierClient::new(),
            scheduler: EngagementScheduler::new(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn scheduler(&self) -> &EngagementScheduler {
        &self.scheduler
    }

    /// Process one observed message. Returns `None` when the message
    /// was dropped by the dedupe index or the local gate; `Some` with
    /// the analysis outcome otherwise. Only invalid input is an error.
    pub async fn observe_message(
        &self,
        text: &str,
        source: Source,
        conversation_id: Option<&str>,
        adapter: Option<Arc<dyn SendAdapter>>,
    ) -> EngineResult<Option<PipelineOutcome>> {
        if text.trim().is_empty() {
            return Err(EngineError::invalid_input("message text is empty"));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(EngineError::invalid_input(format!(
                "message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        if self.state.dedupe.seen(text) {
            debug!("[pipeline] Duplicate message on {} skipped", source);
            return Ok(None);
        }
        self.state.dedupe.mark(text);

        if !detector::quick_check(text) {
            return Ok(None);
        }

        let analysis = self
            .classifier
            .analyze(&self.state, text, source, conversation_id.map(String::from))
            .await?;

        let engagement = adapter.and_then(|adapter| {
            self.scheduler.maybe_engage(
                &analysis.verdict,
                &analysis.session_id,
                text,
                adapter,
                self.state.config().auto_engage,
            )
        });

        Ok(Some(PipelineOutcome { analysis, engagement }))
    }

    /// Bulk reset: engine state plus scheduling records.
    pub fn clear_data(&self) {
        self.state.clear_data();
        self.scheduler.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_with_unreachable_remote() -> MessagePipeline {
        let state = EngineState::new();
        let mut config = state.config();
        config.api_base_url = "http://127.0.0.1:9".into();
        state.update_config(config).unwrap();
        MessagePipeline::new(Arc::new(state))
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_state_change() {
        let pipeline = pipeline_with_unreachable_remote();
        let result = pipeline.observe_message("", Source::Manual, None, None).await;
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        // Not even the dedupe index saw it.
        assert!(!pipeline.state().dedupe.seen(""));
    }

    #[tokio::test]
    async fn oversized_input_is_rejected() {
        let pipeline = pipeline_with_unreachable_remote();
        let huge = "otp kyc ".repeat(400);
        let result = pipeline.observe_message(&huge, Source::Manual, None, None).await;
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        assert!(!pipeline.state().dedupe.seen(&huge));
        assert_eq!(pipeline.state().total_scams(), 0);
    }

    #[tokio::test]
    async fn clean_messages_stop_at_the_gate() {
        let pipeline = pipeline_with_unreachable_remote();
        let outcome = pipeline
            .observe_message("see you at the gym tomorrow", Source::WhatsApp, None, None)
            .await
            .unwrap();
        assert!(outcome.is_none());
        // Gate-dropped messages still count as processed for dedupe.
        assert!(pipeline.state().dedupe.seen("see you at the gym tomorrow"));
    }
}

//! Query dispatcher: one user message in, one assistant turn out.
//!
//! The external contract always resolves. Collaborator failures become a
//! fixed apology turn and are only logged.

use std::sync::Arc;

use agripulse_core::Turn;
use agripulse_llm::{GenerateRequest, LanguageModel};

use crate::conversation::SharedConversation;
use crate::modes::system_instruction;

/// Assistant text appended when the collaborator call fails.
pub const APOLOGY_TEXT: &str =
    "Sorry, I couldn't reach the AgriPulse assistant right now. Please try again in a moment.";

/// Assistant text appended when the collaborator replies with nothing.
pub const EMPTY_REPLY_FALLBACK: &str =
    "Sorry, I couldn't find an answer to that. Please try asking in a different way.";

/// Result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank text; nothing happened.
    Empty,
    /// Another dispatch is pending; nothing happened.
    Busy,
    /// The collaborator replied; this turn was appended.
    Answered(Turn),
    /// The collaborator failed; the apology turn was appended.
    Apologized(Turn),
}

impl DispatchOutcome {
    /// The assistant turn appended by this dispatch, if any.
    pub fn turn(&self) -> Option<&Turn> {
        match self {
            DispatchOutcome::Answered(t) | DispatchOutcome::Apologized(t) => Some(t),
            DispatchOutcome::Empty | DispatchOutcome::Busy => None,
        }
    }

    /// Whether the collaborator was called.
    pub fn was_sent(&self) -> bool {
        self.turn().is_some()
    }
}

/// Clears the pending flag if a dispatch is dropped before its reply lands.
struct PendingGuard<'a> {
    conversation: &'a SharedConversation,
    armed: bool,
}

impl PendingGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Dispatch dropped before completion, clearing pending");
            self.conversation.set_pending(false);
        }
    }
}

/// Sends user messages to the language model and records the replies.
#[derive(Clone)]
pub struct QueryDispatcher {
    model: Arc<dyn LanguageModel>,
    model_id: String,
    conversation: SharedConversation,
}

impl std::fmt::Debug for QueryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDispatcher")
            .field("model", &self.model.name())
            .field("model_id", &self.model_id)
            .field("conversation", &self.conversation.id())
            .finish()
    }
}

impl QueryDispatcher {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        model_id: impl Into<String>,
        conversation: SharedConversation,
    ) -> Self {
        Self {
            model,
            model_id: model_id.into(),
            conversation,
        }
    }

    /// Dispatch `text` with the conversation's history and mode.
    ///
    /// Blank text and dispatches made while another is pending are no-ops.
    /// Otherwise the user turn is appended immediately, exactly one call is
    /// made, and exactly one assistant turn is appended when it completes.
    pub async fn dispatch(&self, text: &str) -> DispatchOutcome {
        if text.trim().is_empty() {
            return DispatchOutcome::Empty;
        }

        let Some(snapshot) = self.conversation.begin_dispatch(Turn::user(text)) else {
            tracing::debug!("Dispatch rejected: a request is already pending");
            return DispatchOutcome::Busy;
        };
        let mut guard = PendingGuard {
            conversation: &self.conversation,
            armed: true,
        };

        let request = GenerateRequest::new(self.model_id.clone(), snapshot.history)
            .with_system_instruction(system_instruction(snapshot.mode.as_deref()));

        tracing::info!(
            conversation_id = %snapshot.conversation_id,
            mode = snapshot.mode.as_deref().unwrap_or("none"),
            turns = request.turns.len(),
            model = self.model.name(),
            "Dispatching query"
        );

        let outcome = match self.model.generate(request).await {
            Ok(reply) if !reply.text.trim().is_empty() => {
                DispatchOutcome::Answered(Turn::assistant(reply.text))
            }
            Ok(_) => {
                tracing::warn!("Model returned an empty reply, using fallback text");
                DispatchOutcome::Answered(Turn::assistant(EMPTY_REPLY_FALLBACK))
            }
            Err(e) => {
                tracing::error!(error = %e, model = self.model.name(), "Dispatch failed");
                DispatchOutcome::Apologized(Turn::assistant(APOLOGY_TEXT))
            }
        };

        if let Some(turn) = outcome.turn() {
            let landed_in = self.conversation.finish_dispatch(turn.clone());
            guard.disarm();
            if landed_in != snapshot.conversation_id {
                tracing::debug!(
                    started_in = %snapshot.conversation_id,
                    landed_in = %landed_in,
                    "Conversation was reset while the reply was in flight"
                );
            }
        }

        outcome
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agripulse_core::Role;
    use agripulse_llm::{LlmError, MockModel};

    fn setup(model: MockModel) -> (QueryDispatcher, SharedConversation, Arc<MockModel>) {
        let model = Arc::new(model);
        let conv = SharedConversation::new();
        let dispatcher = QueryDispatcher::new(model.clone(), "test-model", conv.clone());
        (dispatcher, conv, model)
    }

    #[tokio::test]
    async fn test_dispatch_appends_user_and_assistant() {
        let (d, conv, model) = setup(MockModel::with_replies(["Sow in November."]));
        let outcome = d.dispatch("When to sow wheat?").await;

        assert_eq!(
            outcome,
            DispatchOutcome::Answered(Turn::assistant("Sow in November."))
        );
        let turns = conv.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], Turn::user("When to sow wheat?"));
        assert_eq!(turns[1].role, Role::Assistant);
        assert!(!conv.is_pending());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_text_is_noop() {
        let (d, conv, model) = setup(MockModel::new());
        assert_eq!(d.dispatch("").await, DispatchOutcome::Empty);
        assert_eq!(d.dispatch("   ").await, DispatchOutcome::Empty);
        assert_eq!(d.dispatch("\n\t").await, DispatchOutcome::Empty);
        assert!(conv.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_busy_is_noop() {
        let (d, conv, model) = setup(MockModel::new());
        conv.set_pending(true);
        assert_eq!(d.dispatch("hello").await, DispatchOutcome::Busy);
        assert!(conv.is_empty());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_appends_apology() {
        let model = MockModel::new();
        model.push_error(LlmError::Http("connection refused".into()));
        let (d, conv, _) = setup(model);

        let outcome = d.dispatch("hello").await;
        assert_eq!(outcome, DispatchOutcome::Apologized(Turn::assistant(APOLOGY_TEXT)));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.turns()[1].text, APOLOGY_TEXT);
        assert!(!conv.is_pending());
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback() {
        let (d, conv, _) = setup(MockModel::with_replies(["   "]));
        let outcome = d.dispatch("hello").await;
        assert_eq!(
            outcome,
            DispatchOutcome::Answered(Turn::assistant(EMPTY_REPLY_FALLBACK))
        );
        assert_eq!(conv.turns()[1].text, EMPTY_REPLY_FALLBACK);
    }

    #[tokio::test]
    async fn test_request_carries_history_and_generic_instruction() {
        let (d, _, model) = setup(MockModel::with_replies(["a1", "a2"]));
        d.dispatch("q1").await;
        d.dispatch("q2").await;

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        let last = &requests[1];
        assert_eq!(last.model, "test-model");
        let texts: Vec<_> = last.turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2"]);
        assert_eq!(
            last.system_instruction.as_deref(),
            Some(system_instruction(None).as_str())
        );
    }

    #[tokio::test]
    async fn test_request_uses_mode_instruction() {
        let (d, conv, model) = setup(MockModel::new());
        conv.set_active_mode(Some("WEATHER".into()));
        d.dispatch("rain?").await;
        let req = &model.requests()[0];
        assert!(req
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("WEATHER"));
    }

    /// Model whose reply never arrives.
    struct StalledModel;

    #[async_trait::async_trait]
    impl LanguageModel for StalledModel {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn generate(
            &self,
            _request: GenerateRequest,
        ) -> Result<agripulse_llm::GenerateResponse, LlmError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_dispatch_clears_pending() {
        let conv = SharedConversation::new();
        let d = QueryDispatcher::new(Arc::new(StalledModel), "test-model", conv.clone());

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), d.dispatch("hello")).await;
        assert!(timed_out.is_err());

        assert!(!conv.is_pending());
        assert_eq!(conv.turns(), vec![Turn::user("hello")]);
        assert!(conv.begin_dispatch(Turn::user("again")).is_some());
    }

    #[tokio::test]
    async fn test_outcome_helpers() {
        assert!(DispatchOutcome::Empty.turn().is_none());
        assert!(!DispatchOutcome::Busy.was_sent());
        assert!(DispatchOutcome::Apologized(Turn::assistant("x")).was_sent());
    }
}

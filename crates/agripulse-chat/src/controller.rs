//! Chat controller: the single entry point a front end drives.
//!
//! Owns the staged query and the conversation, and routes user actions to
//! the dispatcher, mode selector and translate adapter.

use std::sync::Arc;

use agripulse_core::{NoticeSink, PendingQuery, Turn};
use agripulse_llm::LanguageModel;

use crate::conversation::SharedConversation;
use crate::dispatcher::{DispatchOutcome, QueryDispatcher};
use crate::error::ChatError;
use crate::modes::ModeSelector;
use crate::translate::Translator;

#[derive(Debug, Clone)]
pub struct ChatController {
    pending: PendingQuery,
    conversation: SharedConversation,
    dispatcher: QueryDispatcher,
    modes: ModeSelector,
    translator: Translator,
}

impl ChatController {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        model_id: impl Into<String>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        let model_id = model_id.into();
        let pending = PendingQuery::new();
        let conversation = SharedConversation::new();
        let dispatcher = QueryDispatcher::new(model.clone(), model_id.clone(), conversation.clone());
        let modes = ModeSelector::new(conversation.clone());
        let translator = Translator::new(model, model_id, pending.clone(), notices);

        Self {
            pending,
            conversation,
            dispatcher,
            modes,
            translator,
        }
    }

    /// Handle onto the staged query, for input adapters.
    pub fn pending_query(&self) -> PendingQuery {
        self.pending.clone()
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }

    pub fn set_query(&self, text: impl Into<String>) {
        self.pending.set(text);
    }

    pub fn query(&self) -> String {
        self.pending.get()
    }

    /// Dispatch the staged query.
    ///
    /// The staged text is cleared only when the dispatch is accepted; blank
    /// text and submits while a reply is pending leave it in place.
    pub async fn submit(&self) -> DispatchOutcome {
        if self.pending.is_blank() {
            return DispatchOutcome::Empty;
        }
        if self.conversation.is_pending() {
            tracing::debug!("Submit ignored: a reply is pending");
            return DispatchOutcome::Busy;
        }

        let text = self.pending.take();
        let outcome = self.dispatcher.dispatch(&text).await;
        if outcome == DispatchOutcome::Busy && self.pending.is_blank() {
            self.pending.set(text);
        }
        outcome
    }

    /// Submit from the home screen: open an empty chat if none is open.
    ///
    /// Rejected searches leave the conversation and the chat view untouched.
    pub async fn search(&self) -> DispatchOutcome {
        if self.pending.is_blank() {
            return DispatchOutcome::Empty;
        }
        if self.conversation.is_pending() {
            tracing::debug!("Search ignored: a reply is pending");
            return DispatchOutcome::Busy;
        }
        if !self.conversation.is_chat_open() {
            self.open_chat();
        }
        self.submit().await
    }

    /// Open the chat view on an empty conversation.
    pub fn open_chat(&self) {
        self.conversation.reset(None);
        self.conversation.set_chat_open(true);
    }

    pub fn select_mode(&self, label: &str) {
        self.modes.select_mode(label);
    }

    pub fn clear_mode(&self) {
        self.modes.clear_mode();
    }

    /// Leave the chat view: clear the mode and the transcript.
    pub fn close_chat(&self) {
        self.modes.clear_mode();
        self.conversation.reset(None);
        tracing::info!("Chat closed");
    }

    pub fn active_mode(&self) -> Option<String> {
        self.modes.active_mode()
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        self.modes.suggestions()
    }

    /// Dispatch `suggestion` directly. The staged query is not touched.
    pub async fn select_suggestion(&self, suggestion: &str) -> DispatchOutcome {
        self.dispatcher.dispatch(suggestion).await
    }

    pub async fn translate_pending(&self) -> Result<String, ChatError> {
        self.translator.translate_pending().await
    }

    pub fn is_translating(&self) -> bool {
        self.translator.is_translating()
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.conversation.turns()
    }

    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending()
    }

    pub fn is_chat_open(&self) -> bool {
        self.conversation.is_chat_open()
    }
}

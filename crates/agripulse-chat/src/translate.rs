//! Translate adapter: English and Hindi, in whichever direction applies.
//!
//! The result replaces the staged query. Failures are reported through the
//! notice channel and leave the staged query as it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agripulse_core::{Notice, NoticeSink, PendingQuery, Turn};
use agripulse_llm::{GenerateRequest, LanguageModel};

use crate::error::ChatError;

fn translation_prompt(text: &str) -> String {
    format!(
        "Translate the following text. If it is in English, translate it to Hindi. \
If it is in Hindi, translate it to English. Reply with the translation only, \
without quotes or explanations.\n\n{}",
        text
    )
}

/// Clears the translating flag when dropped.
struct TranslatingGuard<'a>(&'a AtomicBool);

impl Drop for TranslatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Translates text with the language model and stages the result.
#[derive(Clone)]
pub struct Translator {
    model: Arc<dyn LanguageModel>,
    model_id: String,
    pending: PendingQuery,
    notices: Arc<dyn NoticeSink>,
    translating: Arc<AtomicBool>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("model", &self.model.name())
            .field("model_id", &self.model_id)
            .field("translating", &self.is_translating())
            .finish()
    }
}

impl Translator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        model_id: impl Into<String>,
        pending: PendingQuery,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            model,
            model_id: model_id.into(),
            pending,
            notices,
            translating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_translating(&self) -> bool {
        self.translating.load(Ordering::SeqCst)
    }

    /// Translate the staged query in place.
    pub async fn translate_pending(&self) -> Result<String, ChatError> {
        let text = self.pending.get();
        self.translate(&text).await
    }

    /// Translate `text` and stage the trimmed result.
    ///
    /// Blank input and models that cannot translate are rejected with a
    /// notice and no call. A call made while another is running returns
    /// `ChatError::Busy` and does nothing.
    pub async fn translate(&self, text: &str) -> Result<String, ChatError> {
        if text.trim().is_empty() {
            self.notices.show(Notice::EmptyTranslation);
            return Err(ChatError::EmptyMessage);
        }

        if !self.model.can_translate() {
            self.notices.show(Notice::TranslationUnsupported);
            return Err(ChatError::TranslationUnsupported(
                self.model.name().to_string(),
            ));
        }

        if self
            .translating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Translation already in progress, ignoring");
            return Err(ChatError::Busy);
        }
        let _guard = TranslatingGuard(&self.translating);

        let request = GenerateRequest::new(
            self.model_id.clone(),
            vec![Turn::user(translation_prompt(text.trim()))],
        );

        tracing::info!(chars = text.chars().count(), model = self.model.name(), "Translating");

        match self.model.generate(request).await {
            Ok(reply) if !reply.text.trim().is_empty() => {
                let translated = reply.text.trim().to_string();
                self.pending.set(translated.clone());
                tracing::debug!(chars = translated.chars().count(), "Translation staged");
                Ok(translated)
            }
            Ok(_) => {
                tracing::warn!("Translation returned empty text");
                self.notices.show(Notice::TranslationFailed);
                Err(ChatError::Translation("empty result".to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, "Translation failed");
                self.notices.show(Notice::TranslationFailed);
                Err(ChatError::Translation(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agripulse_core::RecordingNoticeSink;
    use agripulse_llm::{LlmError, MockModel};

    fn setup(model: MockModel) -> (Translator, PendingQuery, Arc<RecordingNoticeSink>, Arc<MockModel>) {
        let model = Arc::new(model);
        let pending = PendingQuery::new();
        let notices = Arc::new(RecordingNoticeSink::new());
        let translator = Translator::new(model.clone(), "test-model", pending.clone(), notices.clone());
        (translator, pending, notices, model)
    }

    #[tokio::test]
    async fn test_translate_stages_trimmed_result() {
        let (t, pending, notices, model) = setup(MockModel::with_replies(["  नमस्ते \n"]));
        pending.set("hello");

        let out = t.translate_pending().await.unwrap();
        assert_eq!(out, "नमस्ते");
        assert_eq!(pending.get(), "नमस्ते");
        assert!(notices.notices().is_empty());
        assert!(!t.is_translating());

        let req = &model.requests()[0];
        assert_eq!(req.turns.len(), 1);
        assert!(req.turns[0].text.ends_with("hello"));
        assert!(req.system_instruction.is_none());
    }

    #[tokio::test]
    async fn test_blank_input_rejected_without_call() {
        let (t, pending, notices, model) = setup(MockModel::new());
        pending.set("   ");

        assert!(matches!(t.translate_pending().await, Err(ChatError::EmptyMessage)));
        assert_eq!(pending.get(), "   ");
        assert_eq!(notices.notices(), vec![Notice::EmptyTranslation]);
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_leaves_pending_unchanged() {
        let model = MockModel::new();
        model.push_error(LlmError::Api {
            status: 503,
            body: "overloaded".into(),
        });
        let (t, pending, notices, _) = setup(model);
        pending.set("hello");

        assert!(matches!(t.translate_pending().await, Err(ChatError::Translation(_))));
        assert_eq!(pending.get(), "hello");
        assert_eq!(notices.notices(), vec![Notice::TranslationFailed]);
        assert!(!t.is_translating());
    }

    #[tokio::test]
    async fn test_empty_result_is_failure() {
        let (t, pending, notices, _) = setup(MockModel::with_replies([" "]));
        pending.set("hello");
        assert!(t.translate_pending().await.is_err());
        assert_eq!(pending.get(), "hello");
        assert_eq!(notices.notices(), vec![Notice::TranslationFailed]);
    }

    #[tokio::test]
    async fn test_unsupported_model() {
        let (t, pending, notices, model) = setup(MockModel::new().without_translation());
        pending.set("hello");
        assert!(matches!(
            t.translate_pending().await,
            Err(ChatError::TranslationUnsupported(_))
        ));
        assert_eq!(notices.notices(), vec![Notice::TranslationUnsupported]);
        assert_eq!(model.call_count(), 0);
        assert_eq!(pending.get(), "hello");
    }

    #[tokio::test]
    async fn test_busy_while_translating() {
        let (t, pending, _, model) = setup(MockModel::new());
        pending.set("hello");
        t.translating.store(true, Ordering::SeqCst);

        assert!(matches!(t.translate_pending().await, Err(ChatError::Busy)));
        assert_eq!(model.call_count(), 0);
        assert_eq!(pending.get(), "hello");
    }

    #[tokio::test]
    async fn test_translate_explicit_text() {
        let (t, pending, _, _) = setup(MockModel::with_replies(["How are you?"]));
        let out = t.translate("आप कैसे हैं?").await.unwrap();
        assert_eq!(out, "How are you?");
        assert_eq!(pending.get(), "How are you?");
    }
}

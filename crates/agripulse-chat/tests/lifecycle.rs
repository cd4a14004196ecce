//! End-to-end tests of the chat lifecycle through `ChatController`.
//!
//! Each test builds its own controller over a scripted or gated model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use agripulse_chat::{ChatController, ChatError, DispatchOutcome, APOLOGY_TEXT};
use agripulse_core::{Notice, RecordingNoticeSink, Role, Turn};
use agripulse_llm::{
    GenerateRequest, GenerateResponse, KnowledgeBase, KnowledgeBaseModel, LanguageModel, LlmError,
    MockModel,
};

// =============================================================================
// Helpers
// =============================================================================

/// Model that holds every call until released.
struct GatedModel {
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedModel {
    fn new() -> Self {
        Self {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for GatedModel {
    fn name(&self) -> &str {
        "gated"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        let question = request.last_user_text().unwrap_or_default().to_string();
        Ok(GenerateResponse::new(format!("answer to {}", question)))
    }
}

fn controller_with(model: Arc<dyn LanguageModel>) -> (ChatController, Arc<RecordingNoticeSink>) {
    let notices = Arc::new(RecordingNoticeSink::new());
    let controller = ChatController::new(model, "test-model", notices.clone());
    (controller, notices)
}

async fn wait_until_pending(controller: &ChatController) {
    while !controller.is_pending() {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn successful_dispatches_alternate_roles() {
    let model = Arc::new(MockModel::with_replies(["a1", "a2", "a3"]));
    let (c, _) = controller_with(model);
    c.open_chat();

    for q in ["q1", "q2", "q3"] {
        let before = c.transcript().len();
        c.set_query(q);
        c.submit().await;
        assert_eq!(c.transcript().len(), before + 2);
    }

    let roles: Vec<Role> = c.transcript().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant
        ]
    );
}

#[tokio::test]
async fn mode_greeting_then_dispatch() {
    let model = Arc::new(MockModel::with_replies(["Check soil moisture first."]));
    let (c, _) = controller_with(model.clone());

    c.select_mode("FARMING");
    let turns = c.transcript();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::Assistant);
    assert!(turns[0].text.contains("FARMING"));

    c.set_query("When should I irrigate?");
    c.submit().await;

    let turns = c.transcript();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[2].text, "Check soil moisture first.");

    let request = &model.requests()[0];
    assert_eq!(request.turns.len(), 2);
    assert!(request
        .system_instruction
        .as_deref()
        .is_some_and(|s| s.contains("FARMING")));
}

#[tokio::test]
async fn blank_queries_never_mutate_or_call() {
    let model = Arc::new(MockModel::new());
    let (c, _) = controller_with(model.clone());
    c.select_mode("WEATHER");
    let before = c.transcript();

    for q in ["", "   ", "\t\n"] {
        c.set_query(q);
        assert_eq!(c.submit().await, DispatchOutcome::Empty);
    }

    assert_eq!(c.transcript(), before);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn second_submit_while_pending_is_noop() {
    let model = Arc::new(GatedModel::new());
    let (c, _) = controller_with(model.clone());
    c.open_chat();

    c.set_query("first");
    let first = tokio::spawn({
        let c = c.clone();
        async move { c.submit().await }
    });
    wait_until_pending(&c).await;

    c.set_query("second");
    assert_eq!(c.submit().await, DispatchOutcome::Busy);
    assert_eq!(c.query(), "second");
    assert_eq!(c.transcript(), vec![Turn::user("first")]);

    model.release();
    let outcome = first.await.unwrap();
    assert_eq!(outcome, DispatchOutcome::Answered(Turn::assistant("answer to first")));
    assert_eq!(model.calls(), 1);
    assert_eq!(c.transcript().len(), 2);
    assert!(!c.is_pending());
}

#[tokio::test]
async fn reply_after_reset_lands_in_new_conversation() {
    let model = Arc::new(GatedModel::new());
    let (c, _) = controller_with(model.clone());
    c.open_chat();
    let old_id = c.conversation().id();

    c.set_query("slow question");
    let first = tokio::spawn({
        let c = c.clone();
        async move { c.submit().await }
    });
    wait_until_pending(&c).await;

    c.select_mode("LIVESTOCK");
    assert_ne!(c.conversation().id(), old_id);
    model.release();
    first.await.unwrap();

    let turns = c.transcript();
    assert_eq!(turns.len(), 2);
    assert!(turns[0].text.contains("LIVESTOCK"));
    assert_eq!(turns[1].text, "answer to slow question");
    assert!(!c.is_pending());
}

#[tokio::test]
async fn search_while_pending_leaves_closed_chat_untouched() {
    let model = Arc::new(GatedModel::new());
    let (c, _) = controller_with(model.clone());
    c.select_mode("FARMING");

    c.set_query("first");
    let first = tokio::spawn({
        let c = c.clone();
        async move { c.submit().await }
    });
    wait_until_pending(&c).await;

    c.clear_mode();
    let before = c.transcript();
    assert_eq!(before.len(), 2);

    c.set_query("second");
    assert_eq!(c.search().await, DispatchOutcome::Busy);
    assert_eq!(c.transcript(), before);
    assert!(!c.is_chat_open());
    assert_eq!(c.query(), "second");

    model.release();
    first.await.unwrap();
    assert_eq!(model.calls(), 1);
    assert_eq!(c.transcript().len(), 3);
}

#[tokio::test]
async fn abandoned_dispatch_does_not_wedge_controller() {
    let model = Arc::new(GatedModel::new());
    let (c, _) = controller_with(model.clone());
    c.open_chat();

    c.set_query("slow question");
    let timed_out = tokio::time::timeout(Duration::from_millis(50), c.submit()).await;
    assert!(timed_out.is_err());
    assert!(!c.is_pending());

    c.close_chat();
    c.select_mode("FARMING");
    model.release();

    c.set_query("next question");
    let outcome = c.submit().await;
    assert_eq!(
        outcome,
        DispatchOutcome::Answered(Turn::assistant("answer to next question"))
    );
    assert_eq!(c.transcript().len(), 3);
    assert!(!c.is_pending());
}

#[tokio::test]
async fn collaborator_failure_appends_single_apology() {
    let model = MockModel::new();
    model.push_error(LlmError::Http("dns failure".into()));
    let (c, notices) = controller_with(Arc::new(model));
    c.select_mode("MARKET PRICES");

    c.set_query("onion price?");
    let outcome = c.submit().await;

    assert!(matches!(outcome, DispatchOutcome::Apologized(_)));
    let turns = c.transcript();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[2], Turn::assistant(APOLOGY_TEXT));
    assert!(!c.is_pending());
    assert!(notices.notices().is_empty());

    c.set_query("try again");
    assert!(c.submit().await.was_sent());
    assert_eq!(c.transcript().len(), 5);
}

// =============================================================================
// Suggestions
// =============================================================================

#[tokio::test]
async fn suggestion_bypasses_input_field() {
    let (c, _) = controller_with(Arc::new(MockModel::new()));
    c.select_mode("FARMING");
    c.set_query("half-typed");

    let suggestion = c.suggestions()[0];
    assert!(c.select_suggestion(suggestion).await.was_sent());
    assert_eq!(c.query(), "half-typed");
    assert_eq!(c.transcript()[1], Turn::user(suggestion));
}

#[tokio::test]
async fn suggestion_equals_stage_and_submit() {
    let via_suggestion = Arc::new(MockModel::new());
    let (a, _) = controller_with(via_suggestion.clone());
    a.select_mode("SOIL HEALTH");
    let suggestion = a.suggestions()[1];
    a.select_suggestion(suggestion).await;

    let via_submit = Arc::new(MockModel::new());
    let (b, _) = controller_with(via_submit.clone());
    b.select_mode("SOIL HEALTH");
    b.set_query(suggestion);
    b.submit().await;

    assert_eq!(a.transcript(), b.transcript());
    assert_eq!(via_suggestion.requests(), via_submit.requests());
}

#[tokio::test]
async fn suggestions_hidden_after_first_exchange() {
    let (c, _) = controller_with(Arc::new(MockModel::new()));
    c.select_mode("CROP DISEASE");
    assert_eq!(c.suggestions().len(), 4);

    c.set_query("aphids");
    c.submit().await;
    assert!(c.suggestions().is_empty());
}

// =============================================================================
// Translation
// =============================================================================

#[tokio::test]
async fn translate_hello_to_hindi() {
    let model = Arc::new(MockModel::with_replies([" नमस्ते "]));
    let (c, notices) = controller_with(model.clone());

    c.set_query("hello");
    assert_eq!(c.translate_pending().await.unwrap(), "नमस्ते");
    assert_eq!(c.query(), "नमस्ते");
    assert!(notices.notices().is_empty());
    assert!(c.transcript().is_empty());
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn translate_blank_makes_no_call() {
    let model = Arc::new(MockModel::new());
    let (c, notices) = controller_with(model.clone());

    c.set_query("");
    assert!(matches!(c.translate_pending().await, Err(ChatError::EmptyMessage)));
    assert_eq!(c.query(), "");
    assert_eq!(notices.notices(), vec![Notice::EmptyTranslation]);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn knowledge_base_cannot_translate_but_answers() {
    let kb = KnowledgeBase::from_json_str(r#"{"wheat": "Sow wheat in November."}"#).unwrap();
    let (c, notices) = controller_with(Arc::new(KnowledgeBaseModel::new(kb)));

    c.set_query("hello");
    assert!(matches!(
        c.translate_pending().await,
        Err(ChatError::TranslationUnsupported(_))
    ));
    assert_eq!(notices.notices(), vec![Notice::TranslationUnsupported]);
    assert_eq!(c.query(), "hello");

    c.set_query("When do I sow WHEAT?");
    c.search().await;
    assert_eq!(c.transcript()[1].text, "Sow wheat in November.");
}

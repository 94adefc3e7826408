//! Mock implementations for testing
//!
//! These mocks enable driving the engine end to end without real I/O.

use super::traits::{Directive, Transport, TransportError};
use crate::render::{RenderError, RenderRequest, Renderer};
use crate::state_machine::{MessageHandle, SessionId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

// ============================================================================
// Mock Renderer
// ============================================================================

/// Mock renderer that returns queued outcomes and records every request
pub struct MockRenderer {
    outcomes: Mutex<VecDeque<Result<Vec<u8>, RenderError>>>,
    pub requests: Mutex<Vec<RenderRequest>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_image(&self, image: &[u8]) {
        self.outcomes.lock().unwrap().push_back(Ok(image.to_vec()));
    }

    pub fn queue_error(&self, error: RenderError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(RenderError::EmptyBody))
    }
}

/// Renderer that holds every request until released
pub struct GatedRenderer {
    pub started: Notify,
    pub release: Notify,
}

impl GatedRenderer {
    pub fn new() -> Self {
        Self {
            started: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl Renderer for GatedRenderer {
    async fn render(&self, _request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(b"late image".to_vec())
    }
}

// ============================================================================
// Recording Transport
// ============================================================================

/// Transport that records directives and hands out sequential handles
pub struct RecordingTransport {
    next_handle: AtomicI64,
    fail_all: bool,
    pub delivered: Mutex<Vec<(SessionId, Directive)>>,
    pub acknowledged: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicI64::new(1),
            fail_all: false,
            delivered: Mutex::new(Vec::new()),
            acknowledged: Mutex::new(Vec::new()),
        }
    }

    /// Transport whose every delivery fails
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn directives_for(&self, session: &SessionId) -> Vec<Directive> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == session)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub fn names_for(&self, session: &SessionId) -> Vec<&'static str> {
        self.directives_for(session)
            .iter()
            .map(Directive::name)
            .collect()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(
        &self,
        session: &SessionId,
        directive: Directive,
    ) -> Result<Option<MessageHandle>, TransportError> {
        let creates_message = !matches!(directive, Directive::Discard(_));
        self.delivered
            .lock()
            .unwrap()
            .push((session.clone(), directive));

        if self.fail_all {
            return Err(TransportError::new("chat unreachable"));
        }
        Ok(creates_message.then(|| MessageHandle(self.next_handle.fetch_add(1, Ordering::SeqCst))))
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        self.acknowledged
            .lock()
            .unwrap()
            .push(callback_id.to_string());
        if self.fail_all {
            return Err(TransportError::new("chat unreachable"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ChoiceKind, Field, PromptCatalog};
    use crate::engine::{ConversationEngine, Disposition, DropReason, InboundEvent};
    use crate::state_machine::{Step, TransitionError};
    use std::sync::Arc;

    type TestEngine = ConversationEngine<Arc<MockRenderer>, Arc<RecordingTransport>>;

    struct Harness {
        engine: Arc<TestEngine>,
        renderer: Arc<MockRenderer>,
        transport: Arc<RecordingTransport>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_transport(RecordingTransport::new())
        }

        fn with_transport(transport: RecordingTransport) -> Self {
            let renderer = Arc::new(MockRenderer::new());
            let transport = Arc::new(transport);
            let engine = Arc::new(ConversationEngine::new(
                PromptCatalog::default(),
                Arc::clone(&renderer),
                Arc::clone(&transport),
            ));
            Self {
                engine,
                renderer,
                transport,
            }
        }

        async fn choice(&self, session: &SessionId, kind: ChoiceKind, value: &str) -> Disposition {
            self.engine
                .handle(
                    session,
                    InboundEvent::Choice {
                        kind,
                        value: value.to_string(),
                    },
                )
                .await
        }

        async fn text(&self, session: &SessionId, text: &str) -> Disposition {
            self.engine
                .handle(
                    session,
                    InboundEvent::Text {
                        text: text.to_string(),
                    },
                )
                .await
        }

        /// Begin, class, subject, teacher, classwork
        async fn fill_to_homework_choice(&self, session: &SessionId) {
            assert!(self.engine.begin_session(session).await.is_accepted());
            assert!(self.choice(session, ChoiceKind::Class, "STD.II").await.is_accepted());
            assert!(self.choice(session, ChoiceKind::Subject, "Science").await.is_accepted());
            assert!(self.text(session, "Ms. Rahman").await.is_accepted());
            assert!(self.text(session, "Algebra worksheet").await.is_accepted());
        }

        async fn step_of(&self, session: &SessionId) -> Option<Step> {
            self.engine.store().lock(session).await.get().map(|r| r.step)
        }
    }

    fn chat(id: i64) -> SessionId {
        SessionId::from(id)
    }

    #[tokio::test]
    async fn test_mock_renderer_queue() {
        let renderer = MockRenderer::new();
        renderer.queue_image(b"png");
        let request = RenderRequest::ClassworkOnly {
            class: "c".into(),
            subject: "s".into(),
            cw: "w".into(),
            teacher: "t".into(),
        };
        assert_eq!(renderer.render(&request).await.unwrap(), b"png".to_vec());
        assert!(renderer.render(&request).await.is_err());
        assert_eq!(renderer.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_no_homework_scenario_renders_classwork_only() {
        let h = Harness::new();
        let s = chat(7);
        h.renderer.queue_image(b"diary");

        h.fill_to_homework_choice(&s).await;
        assert!(h.choice(&s, ChoiceKind::HasHomework, "no").await.is_accepted());

        assert_eq!(
            h.renderer.recorded_requests(),
            vec![RenderRequest::ClassworkOnly {
                class: "STD.II".to_string(),
                subject: "Science".to_string(),
                cw: "Algebra worksheet".to_string(),
                teacher: "Ms. Rahman".to_string(),
            }]
        );
        assert_eq!(h.step_of(&s).await, None);
        assert!(h.engine.store().is_empty());
    }

    #[tokio::test]
    async fn test_homework_scenario_renders_with_blank_remarks() {
        let h = Harness::new();
        let s = chat(8);
        h.renderer.queue_image(b"diary");

        h.fill_to_homework_choice(&s).await;
        assert!(h.choice(&s, ChoiceKind::HasHomework, "yes").await.is_accepted());
        assert_eq!(h.step_of(&s).await, Some(Step::AwaitingHomeworkText));
        assert!(h.text(&s, "pg 10-12").await.is_accepted());
        assert!(h.text(&s, "none").await.is_accepted());

        let requests = h.renderer.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            RenderRequest::WithHomework {
                class: "STD.II".to_string(),
                subject: "Science".to_string(),
                cw: "Algebra worksheet".to_string(),
                hw: "pg 10-12".to_string(),
                remarks: String::new(),
                teacher: "Ms. Rahman".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_success_delivers_image_then_cleans_up() {
        let h = Harness::new();
        let s = chat(9);
        h.renderer.queue_image(b"diary");

        h.fill_to_homework_choice(&s).await;
        h.choice(&s, ChoiceKind::HasHomework, "no").await;

        // class, subject, teacher, cw, homework prompts + generating status
        assert_eq!(
            h.transport.names_for(&s),
            vec![
                "show_prompt",
                "show_prompt",
                "show_prompt",
                "show_prompt",
                "show_prompt",
                "show_generating",
                "deliver_image",
                "discard",
                "offer_restart",
            ]
        );

        let directives = h.transport.directives_for(&s);
        assert_eq!(
            directives[6],
            Directive::DeliverImage {
                image: b"diary".to_vec(),
                caption: PromptCatalog::caption("STD.II", "Science"),
            }
        );
        assert_eq!(
            directives[7],
            Directive::Discard((1..=6).map(MessageHandle).collect())
        );
    }

    #[tokio::test]
    async fn test_render_failure_reports_and_deletes_session() {
        let h = Harness::new();
        let s = chat(10);
        h.renderer.queue_error(RenderError::Status(502));

        h.fill_to_homework_choice(&s).await;
        assert!(h.choice(&s, ChoiceKind::HasHomework, "no").await.is_accepted());

        let names = h.transport.names_for(&s);
        assert!(names.contains(&"report_failure"));
        assert!(!names.contains(&"deliver_image"));
        assert_eq!(names.last(), Some(&"offer_restart"));
        assert_eq!(h.step_of(&s).await, None);

        // Nothing is accepted until a new begin
        assert_eq!(
            h.text(&s, "late text").await,
            Disposition::Dropped(DropReason::NoSession)
        );
        assert_eq!(h.renderer.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_choice_leaves_session_unchanged() {
        let h = Harness::new();
        let s = chat(11);
        h.engine.begin_session(&s).await;

        let before = h.engine.store().lock(&s).await.get().cloned();
        let outcome = h.choice(&s, ChoiceKind::Subject, "Science").await;
        assert_eq!(
            outcome,
            Disposition::Dropped(DropReason::Rejected(TransitionError::UnexpectedChoice {
                step: Step::AwaitingClass,
                kind: ChoiceKind::Subject,
            }))
        );
        let after = h.engine.store().lock(&s).await.get().cloned();
        assert_eq!(before, after);
        assert_eq!(h.step_of(&s).await, Some(Step::AwaitingClass));
    }

    #[tokio::test]
    async fn test_begin_is_idempotent_reset() {
        let h = Harness::new();
        let s = chat(12);
        h.engine.begin_session(&s).await;
        h.choice(&s, ChoiceKind::Class, "STD.II").await;
        assert_eq!(h.step_of(&s).await, Some(Step::AwaitingSubject));

        h.engine.begin_session(&s).await;
        let slot = h.engine.store().lock(&s).await;
        let record = slot.get().unwrap();
        assert_eq!(record.step, Step::AwaitingClass);
        assert!(record.fields.is_empty());
        // Old prompts were handed back for deletion; only the new one remains
        assert_eq!(record.volatile_handles.len(), 1);
        drop(slot);

        assert!(h.transport.names_for(&s).contains(&"discard"));
    }

    #[tokio::test]
    async fn test_restart_button_begins_new_session() {
        let h = Harness::new();
        let s = chat(13);
        h.renderer.queue_image(b"diary");
        h.fill_to_homework_choice(&s).await;
        h.choice(&s, ChoiceKind::HasHomework, "no").await;

        assert!(h.choice(&s, ChoiceKind::Restart, "again").await.is_accepted());
        assert_eq!(h.step_of(&s).await, Some(Step::AwaitingClass));
    }

    #[tokio::test]
    async fn test_events_without_session_are_dropped() {
        let h = Harness::new();
        let s = chat(14);
        assert_eq!(
            h.choice(&s, ChoiceKind::Class, "STD.II").await,
            Disposition::Dropped(DropReason::NoSession)
        );
        assert_eq!(
            h.text(&s, "hello").await,
            Disposition::Dropped(DropReason::NoSession)
        );
        assert!(h.transport.directives_for(&s).is_empty());
        assert!(h.engine.store().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_removes_record() {
        let h = Harness::new();
        let s = chat(15);
        h.engine.begin_session(&s).await;
        h.choice(&s, ChoiceKind::Class, "STD.II").await;

        assert!(h.engine.cancel_session(&s).await.is_accepted());
        assert_eq!(h.step_of(&s).await, None);

        // Both prompts go back in one discard, then the notice
        let directives = h.transport.directives_for(&s);
        assert_eq!(
            h.transport.names_for(&s),
            vec!["show_prompt", "show_prompt", "discard", "notice"]
        );
        assert_eq!(
            directives[2],
            Directive::Discard(vec![MessageHandle(1), MessageHandle(2)])
        );

        // Nothing left to cancel: no reply at all
        assert_eq!(
            h.engine.cancel_session(&s).await,
            Disposition::Dropped(DropReason::NoSession)
        );
        assert_eq!(h.transport.directives_for(&s).len(), 4);
        assert!(h.renderer.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failures_do_not_abort_conversation() {
        let h = Harness::with_transport(RecordingTransport::failing());
        let s = chat(16);
        h.renderer.queue_image(b"diary");

        h.fill_to_homework_choice(&s).await;
        assert!(h.choice(&s, ChoiceKind::HasHomework, "no").await.is_accepted());
        assert_eq!(h.renderer.recorded_requests().len(), 1);
        assert_eq!(h.step_of(&s).await, None);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let h = Harness::new();
        let (a, b) = (chat(21), chat(22));
        h.engine.begin_session(&a).await;
        h.engine.begin_session(&b).await;

        h.choice(&a, ChoiceKind::Class, "STD.II").await;
        h.choice(&b, ChoiceKind::Class, "STD.III").await;
        h.choice(&a, ChoiceKind::Subject, "Art").await;

        assert_eq!(h.step_of(&a).await, Some(Step::AwaitingTeacher));
        assert_eq!(h.step_of(&b).await, Some(Step::AwaitingSubject));
        let slot = h.engine.store().lock(&b).await;
        assert_eq!(slot.get().unwrap().field(Field::Class), Some("STD.III"));
    }

    #[tokio::test]
    async fn test_events_during_render_find_no_session() {
        let renderer = Arc::new(GatedRenderer::new());
        let transport = Arc::new(RecordingTransport::new());
        let engine = Arc::new(ConversationEngine::new(
            PromptCatalog::default(),
            Arc::clone(&renderer),
            Arc::clone(&transport),
        ));
        let (a, b) = (chat(31), chat(32));

        engine.begin_session(&a).await;
        for (kind, value) in [(ChoiceKind::Class, "STD.II"), (ChoiceKind::Subject, "Art")] {
            engine.handle_choice(&a, kind, value.to_string()).await;
        }
        engine.handle_text(&a, "Mr. Karim".to_string()).await;
        engine.handle_text(&a, "Drawing".to_string()).await;

        let finishing = {
            let engine = Arc::clone(&engine);
            let a = a.clone();
            tokio::spawn(async move {
                engine
                    .handle_choice(&a, ChoiceKind::HasHomework, "no".to_string())
                    .await
            })
        };
        renderer.started.notified().await;

        // Same session: record already gone
        assert_eq!(
            engine.handle_text(&a, "extra".to_string()).await,
            Disposition::Dropped(DropReason::NoSession)
        );
        // Other sessions are not blocked by the outstanding render
        assert!(engine.begin_session(&b).await.is_accepted());

        renderer.release.notify_one();
        assert!(finishing.await.unwrap().is_accepted());
        assert!(transport.names_for(&a).contains(&"deliver_image"));
    }
}

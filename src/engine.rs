//! Conversation engine
//!
//! Drives one diary form per chat: applies inbound events to the session
//! record through the pure state machine, shows the next prompt, and runs the
//! single render round trip when a form is complete.

mod store;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use store::SessionStore;
pub use traits::{Directive, Transport, TransportError};

use crate::catalog::{ChoiceKind, PromptCatalog};
use crate::render::{RenderRequest, Renderer};
use crate::state_machine::{
    transition, Effect, Event, MessageHandle, SessionId, SessionRecord, Step, TransitionError,
};

const CANCELLED_TEXT: &str = "Cancelled. Send /start to begin again.";

/// Event delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Start (or restart) the form
    Begin,
    /// Button press
    Choice { kind: ChoiceKind, value: String },
    /// Plain text message
    Text { text: String },
    /// Abandon the form
    Cancel,
}

/// Why an event changed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    NoSession,
    Rejected(TransitionError),
}

/// What happened to an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Accepted,
    Dropped(DropReason),
}

impl Disposition {
    #[cfg(test)]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Disposition::Accepted)
    }
}

/// Conversation engine over any renderer and transport
pub struct ConversationEngine<R, T>
where
    R: Renderer + 'static,
    T: Transport + 'static,
{
    store: SessionStore,
    catalog: PromptCatalog,
    renderer: R,
    transport: T,
}

impl<R, T> ConversationEngine<R, T>
where
    R: Renderer + 'static,
    T: Transport + 'static,
{
    pub fn new(catalog: PromptCatalog, renderer: R, transport: T) -> Self {
        Self {
            store: SessionStore::new(),
            catalog,
            renderer,
            transport,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Route an inbound event to the matching operation
    pub async fn handle(&self, session: &SessionId, event: InboundEvent) -> Disposition {
        match event {
            InboundEvent::Begin => self.begin_session(session).await,
            InboundEvent::Choice { kind, value } => self.handle_choice(session, kind, value).await,
            InboundEvent::Text { text } => self.handle_text(session, text).await,
            InboundEvent::Cancel => self.cancel_session(session).await,
        }
    }

    /// Discard any form in progress and start over at the class question
    pub async fn begin_session(&self, session: &SessionId) -> Disposition {
        let mut slot = self.store.lock(session).await;

        if let Some(mut previous) = slot.take() {
            tracing::info!(session = %session, step = ?previous.step, "Restarting session");
            self.discard(session, previous.take_handles()).await;
        } else {
            tracing::info!(session = %session, "Starting session");
        }

        let mut record = SessionRecord::new(session.clone());
        let prompt = self.catalog.prompt_for(Step::AwaitingClass);
        self.show(&mut record, Directive::ShowPrompt(prompt)).await;
        slot.set(record);

        Disposition::Accepted
    }

    /// Delete the session's record. Absent sessions are not an error.
    pub async fn cancel_session(&self, session: &SessionId) -> Disposition {
        let mut slot = self.store.lock(session).await;
        let Some(mut record) = slot.take() else {
            return Disposition::Dropped(DropReason::NoSession);
        };
        drop(slot);

        tracing::info!(session = %session, step = ?record.step, "Session cancelled");
        self.discard(session, record.take_handles()).await;
        self.send(session, Directive::Notice(CANCELLED_TEXT.to_string())).await;
        Disposition::Accepted
    }

    /// Apply a button press. A restart button behaves like `begin_session`.
    pub async fn handle_choice(
        &self,
        session: &SessionId,
        kind: ChoiceKind,
        value: String,
    ) -> Disposition {
        if kind == ChoiceKind::Restart {
            return self.begin_session(session).await;
        }
        self.apply(session, Event::choice(kind, value)).await
    }

    /// Apply a free-text message
    pub async fn handle_text(&self, session: &SessionId, text: String) -> Disposition {
        self.apply(session, Event::text(text)).await
    }

    async fn apply(&self, session: &SessionId, event: Event) -> Disposition {
        let mut slot = self.store.lock(session).await;

        let result = {
            let Some(record) = slot.get() else {
                tracing::debug!(session = %session, "No active session, dropping event");
                return Disposition::Dropped(DropReason::NoSession);
            };
            match transition(record, event) {
                Ok(result) => result,
                Err(e) => {
                    tracing::debug!(session = %session, step = ?record.step, reason = %e, "Dropping event");
                    return Disposition::Dropped(DropReason::Rejected(e));
                }
            }
        };

        let mut record = result.new_record;
        let mut render = None;
        for effect in result.effects {
            match effect {
                Effect::ShowPrompt { step } => {
                    let prompt = self.catalog.prompt_for(step);
                    self.show(&mut record, Directive::ShowPrompt(prompt)).await;
                }
                Effect::DispatchRender { request } => render = Some(request),
            }
        }

        tracing::debug!(session = %session, step = ?record.step, "Event accepted");

        match render {
            Some(request) => {
                // The record leaves the store before the round trip, so
                // anything arriving meanwhile finds no session.
                slot.take();
                drop(slot);
                self.finish(record, request).await;
            }
            None => slot.set(record),
        }

        Disposition::Accepted
    }

    /// Render a completed form and report the outcome. Runs outside the
    /// session's critical section.
    async fn finish(&self, mut record: SessionRecord, request: RenderRequest) {
        let session = record.session_id.clone();
        tracing::info!(session = %session, shape = request.shape(), "Form complete, rendering");

        let generating = self.catalog.generating().text;
        self.show(&mut record, Directive::ShowGenerating(generating)).await;

        match self.renderer.render(&request).await {
            Ok(image) => {
                let caption = PromptCatalog::caption(request.class(), request.subject());
                self.send(&session, Directive::DeliverImage { image, caption }).await;
            }
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "Reporting render failure to user");
                let notice = self.catalog.failure().text;
                self.send(&session, Directive::ReportFailure(notice)).await;
            }
        }

        self.discard(&session, record.take_handles()).await;
        self.send(&session, Directive::OfferRestart(self.catalog.restart())).await;
    }

    /// Deliver a directive and remember the message it created
    async fn show(&self, record: &mut SessionRecord, directive: Directive) {
        let session = record.session_id.clone();
        if let Some(handle) = self.send(&session, directive).await {
            record.volatile_handles.push(handle);
        }
    }

    async fn discard(&self, session: &SessionId, handles: Vec<MessageHandle>) {
        if !handles.is_empty() {
            self.send(session, Directive::Discard(handles)).await;
        }
    }

    /// Best-effort delivery: failures are logged and swallowed
    async fn send(&self, session: &SessionId, directive: Directive) -> Option<MessageHandle> {
        let name = directive.name();
        match self.transport.deliver(session, directive).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(session = %session, directive = name, error = %e, "Delivery failed");
                None
            }
        }
    }
}

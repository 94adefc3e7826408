//! Answers a session can receive while a form is being filled

use crate::catalog::ChoiceKind;

/// Events that trigger step transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A button press
    Choice { kind: ChoiceKind, value: String },
    /// A plain text message
    Text { text: String },
}

impl Event {
    pub fn choice(kind: ChoiceKind, value: impl Into<String>) -> Self {
        Event::Choice {
            kind,
            value: value.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Event::Text { text: text.into() }
    }
}

//! Session state types

use crate::catalog::{ChoiceKind, Field};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of a chat; the Session Store key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Reference to a message the transport showed on behalf of a session.
///
/// Only the transport interprets it; the engine just hands it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub i64);

/// The single thing a session expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    AwaitingClass,
    AwaitingSubject,
    AwaitingTeacher,
    AwaitingCw,
    AwaitingHomeworkChoice,
    AwaitingHomeworkText,
    AwaitingRemarks,
    /// Form complete, render dispatched. A record never rests here.
    Rendering,
}

impl Step {
    /// Button kind this step accepts, if any
    #[cfg(test)]
    pub fn expected_choice(self) -> Option<ChoiceKind> {
        match self {
            Step::AwaitingClass => Some(ChoiceKind::Class),
            Step::AwaitingSubject => Some(ChoiceKind::Subject),
            Step::AwaitingHomeworkChoice => Some(ChoiceKind::HasHomework),
            Step::AwaitingTeacher
            | Step::AwaitingCw
            | Step::AwaitingHomeworkText
            | Step::AwaitingRemarks
            | Step::Rendering => None,
        }
    }

    /// Field filled by free text at this step, if any
    pub fn text_field(self) -> Option<Field> {
        match self {
            Step::AwaitingTeacher => Some(Field::Teacher),
            Step::AwaitingCw => Some(Field::Cw),
            Step::AwaitingHomeworkText => Some(Field::Hw),
            Step::AwaitingRemarks => Some(Field::Remarks),
            Step::AwaitingClass
            | Step::AwaitingSubject
            | Step::AwaitingHomeworkChoice
            | Step::Rendering => None,
        }
    }

    #[cfg(test)]
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Rendering)
    }
}

/// One in-progress form fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub step: Step,
    /// Collected answers. Fields not yet collected are absent, not empty.
    pub fields: BTreeMap<Field, String>,
    /// Unset until the homework question is answered
    pub has_homework: Option<bool>,
    /// Messages shown for this session that are cleaned up when it ends
    pub volatile_handles: Vec<MessageHandle>,
}

impl SessionRecord {
    /// Fresh record at the first step
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            step: Step::AwaitingClass,
            fields: BTreeMap::new(),
            has_homework: None,
            volatile_handles: Vec::new(),
        }
    }

    pub fn field(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn take_handles(&mut self) -> Vec<MessageHandle> {
        std::mem::take(&mut self.volatile_handles)
    }
}

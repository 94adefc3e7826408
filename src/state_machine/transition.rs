//! Pure step transition function

use super::{Effect, Event, SessionRecord, Step};
use crate::catalog::{parse_homework_choice, ChoiceKind, Field, COMMAND_SENTINEL};
use crate::render::RenderRequest;
use thiserror::Error;

/// Remarks answer that means "leave it blank" (any casing)
const NO_REMARKS: &str = "none";

/// Result of a step transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_record: SessionRecord,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(record: SessionRecord) -> Self {
        Self {
            new_record: record,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The render request, if this transition completed the form
    #[cfg(test)]
    pub fn render_request(&self) -> Option<&RenderRequest> {
        self.effects.iter().find_map(|e| match e {
            Effect::DispatchRender { request } => Some(request),
            Effect::ShowPrompt { .. } => None,
        })
    }
}

/// Reasons an event is not accepted. None of these are user-facing; the
/// caller drops the event and leaves the record untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{kind:?} choice does not match step {step:?}")]
    UnexpectedChoice { step: Step, kind: ChoiceKind },
    #[error("text does not match step {step:?}")]
    UnexpectedText { step: Step },
    #[error("command text is never collected")]
    CommandText,
    #[error("empty text is never collected")]
    EmptyText,
    #[error("unrecognised value {value:?} for {kind:?} choice")]
    InvalidChoiceValue { kind: ChoiceKind, value: String },
    #[error("form is missing {0} at render time")]
    MissingField(Field),
}

/// Pure transition function
///
/// Given the same record and event it always produces the same result and
/// performs no I/O. On error the caller keeps the original record.
pub fn transition(record: &SessionRecord, event: Event) -> Result<TransitionResult, TransitionError> {
    match (record.step, event) {
        // ============================================================
        // Button answers
        // ============================================================
        (Step::AwaitingClass, Event::Choice { kind: ChoiceKind::Class, value }) => {
            Ok(collect(record, Field::Class, value, Step::AwaitingSubject))
        }

        (Step::AwaitingSubject, Event::Choice { kind: ChoiceKind::Subject, value }) => {
            Ok(collect(record, Field::Subject, value, Step::AwaitingTeacher))
        }

        (Step::AwaitingHomeworkChoice, Event::Choice { kind: ChoiceKind::HasHomework, value }) => {
            match parse_homework_choice(&value) {
                Some(true) => {
                    let mut new_record = record.clone();
                    new_record.has_homework = Some(true);
                    new_record.step = Step::AwaitingHomeworkText;
                    Ok(TransitionResult::new(new_record).with_effect(Effect::ShowPrompt {
                        step: Step::AwaitingHomeworkText,
                    }))
                }
                Some(false) => {
                    let mut new_record = record.clone();
                    new_record.has_homework = Some(false);
                    new_record.fields.insert(Field::Hw, String::new());
                    new_record.fields.insert(Field::Remarks, String::new());
                    dispatch(new_record)
                }
                None => Err(TransitionError::InvalidChoiceValue {
                    kind: ChoiceKind::HasHomework,
                    value,
                }),
            }
        }

        (step, Event::Choice { kind, .. }) => Err(TransitionError::UnexpectedChoice { step, kind }),

        // ============================================================
        // Text answers
        // ============================================================
        (_, Event::Text { text }) if text.starts_with(COMMAND_SENTINEL) => {
            Err(TransitionError::CommandText)
        }

        (step, Event::Text { .. }) if step.text_field().is_none() => {
            Err(TransitionError::UnexpectedText { step })
        }

        (_, Event::Text { text }) if text.is_empty() => Err(TransitionError::EmptyText),

        (Step::AwaitingTeacher, Event::Text { text }) => {
            Ok(collect(record, Field::Teacher, text, Step::AwaitingCw))
        }

        (Step::AwaitingCw, Event::Text { text }) => {
            Ok(collect(record, Field::Cw, text, Step::AwaitingHomeworkChoice))
        }

        (Step::AwaitingHomeworkText, Event::Text { text }) => {
            Ok(collect(record, Field::Hw, text, Step::AwaitingRemarks))
        }

        (Step::AwaitingRemarks, Event::Text { text }) => {
            let remarks = if text.eq_ignore_ascii_case(NO_REMARKS) {
                String::new()
            } else {
                text
            };
            let mut new_record = record.clone();
            new_record.fields.insert(Field::Remarks, remarks);
            dispatch(new_record)
        }

        (step, Event::Text { .. }) => Err(TransitionError::UnexpectedText { step }),
    }
}

/// Store one answer and move to the next prompt
fn collect(record: &SessionRecord, field: Field, value: String, next: Step) -> TransitionResult {
    let mut new_record = record.clone();
    new_record.fields.insert(field, value);
    new_record.step = next;
    TransitionResult::new(new_record).with_effect(Effect::ShowPrompt { step: next })
}

/// Close the form and hand it to the renderer
fn dispatch(mut record: SessionRecord) -> Result<TransitionResult, TransitionError> {
    let request = RenderRequest::from_record(&record).map_err(TransitionError::MissingField)?;
    record.step = Step::Rendering;
    Ok(TransitionResult::new(record).with_effect(Effect::DispatchRender { request }))
}

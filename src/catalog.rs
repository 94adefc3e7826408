//! Prompt catalog
//!
//! Static definition of the fields a diary collects, the text shown for each
//! step, and the fixed option sets for button-style fields.

use crate::state_machine::Step;
use std::fmt;

/// Separator between kind and value in button callback data
pub const CALLBACK_SEPARATOR: char = ':';

/// Leading character reserved for session-control commands
pub const COMMAND_SENTINEL: char = '/';

/// A collected form field, named the way the render endpoint names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Class,
    Subject,
    Teacher,
    Cw,
    Hw,
    Remarks,
}

impl Field {
    /// Query parameter name
    pub fn key(self) -> &'static str {
        match self {
            Field::Class => "class",
            Field::Subject => "subject",
            Field::Teacher => "teacher",
            Field::Cw => "cw",
            Field::Hw => "hw",
            Field::Remarks => "remarks",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Kind of a button press, carried as the prefix of the callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceKind {
    Class,
    Subject,
    HasHomework,
    Restart,
}

impl ChoiceKind {
    pub fn tag(self) -> &'static str {
        match self {
            ChoiceKind::Class => "class",
            ChoiceKind::Subject => "subject",
            ChoiceKind::HasHomework => "hw",
            ChoiceKind::Restart => "restart",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "class" => Some(ChoiceKind::Class),
            "subject" => Some(ChoiceKind::Subject),
            "hw" => Some(ChoiceKind::HasHomework),
            "restart" => Some(ChoiceKind::Restart),
            _ => None,
        }
    }
}

/// Encode a button press as callback data (`kind:value`)
pub fn encode_callback(kind: ChoiceKind, value: &str) -> String {
    format!("{}{CALLBACK_SEPARATOR}{value}", kind.tag())
}

/// Decode callback data. The split happens at the first separator so values
/// may contain the separator themselves.
pub fn decode_callback(data: &str) -> Option<(ChoiceKind, &str)> {
    let (tag, value) = data.split_once(CALLBACK_SEPARATOR)?;
    Some((ChoiceKind::from_tag(tag)?, value))
}

/// Canonical values of the homework branch buttons
pub const HOMEWORK_YES: &str = "yes";
pub const HOMEWORK_NO: &str = "no";

/// Parse the value of a homework button
pub fn parse_homework_choice(value: &str) -> Option<bool> {
    match value {
        HOMEWORK_YES => Some(true),
        HOMEWORK_NO => Some(false),
        _ => None,
    }
}

/// A selectable option. Only `value` is ever sent to the renderer; `label`
/// is presentation and is never parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOption {
    pub label: String,
    pub value: String,
}

impl PromptOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Option whose label and value are the same string
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// How the user answers a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modality {
    /// Pick one of a fixed option set
    Choice {
        kind: ChoiceKind,
        options: Vec<PromptOption>,
    },
    /// Type a message
    FreeText,
    /// Nothing to answer (status messages)
    None,
}

/// A prompt ready to be shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub modality: Modality,
}

impl Prompt {
    fn choice(text: &str, kind: ChoiceKind, options: Vec<PromptOption>) -> Self {
        Self {
            text: text.to_string(),
            modality: Modality::Choice { kind, options },
        }
    }

    fn free_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            modality: Modality::FreeText,
        }
    }

    fn status(text: &str) -> Self {
        Self {
            text: text.to_string(),
            modality: Modality::None,
        }
    }

    /// Callback data for each option, in display order
    pub fn callbacks(&self) -> Vec<(String, String)> {
        match &self.modality {
            Modality::Choice { kind, options } => options
                .iter()
                .map(|o| (o.label.clone(), encode_callback(*kind, &o.value)))
                .collect(),
            Modality::FreeText | Modality::None => vec![],
        }
    }
}

const CLASS_TEXT: &str = "Welcome to the diary making page. Please select your class:";
const SUBJECT_TEXT: &str = "Great! Now select your subject:";
const TEACHER_TEXT: &str = "Please enter the teacher's name:";
const CW_TEXT: &str = "Got it. Please enter your CW (Classwork):";
const HOMEWORK_CHOICE_TEXT: &str = "Is there any HW (Homework) for today?";
const HOMEWORK_TEXT: &str = "Please enter the HW (Homework):";
const REMARKS_TEXT: &str = "Please enter any remarks (send \"none\" to leave it blank):";
const GENERATING_TEXT: &str = "Generating your diary, please wait...";
const FAILURE_TEXT: &str = "Sorry, the diary could not be generated. Please try again.";
const RESTART_TEXT: &str = "Would you like to make another diary?";
const RESTART_LABEL: &str = "Make another diary";

/// The option sets and texts for every step
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    classes: Vec<PromptOption>,
    subjects: Vec<PromptOption>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            classes: vec![
                PromptOption::new("STD 1 (Orchid)", "STD.I (Orchid)"),
                PromptOption::new("STD 2", "STD.II"),
                PromptOption::new("STD 3", "STD.III"),
                PromptOption::new("STD 4", "STD.IV"),
                PromptOption::new("STD 5", "STD.V"),
            ],
            subjects: ["Art", "Bangla", "English", "Maths", "Science"]
                .into_iter()
                .map(PromptOption::plain)
                .collect(),
        }
    }
}

impl PromptCatalog {
    #[cfg(test)]
    pub fn classes(&self) -> &[PromptOption] {
        &self.classes
    }

    #[cfg(test)]
    pub fn subjects(&self) -> &[PromptOption] {
        &self.subjects
    }

    /// Prompt shown when a session enters `step`.
    ///
    /// `Rendering` has no question attached; it maps to the generating status.
    pub fn prompt_for(&self, step: Step) -> Prompt {
        match step {
            Step::AwaitingClass => Prompt::choice(CLASS_TEXT, ChoiceKind::Class, self.classes.clone()),
            Step::AwaitingSubject => {
                Prompt::choice(SUBJECT_TEXT, ChoiceKind::Subject, self.subjects.clone())
            }
            Step::AwaitingTeacher => Prompt::free_text(TEACHER_TEXT),
            Step::AwaitingCw => Prompt::free_text(CW_TEXT),
            Step::AwaitingHomeworkChoice => Prompt::choice(
                HOMEWORK_CHOICE_TEXT,
                ChoiceKind::HasHomework,
                vec![
                    PromptOption::new("Yes", HOMEWORK_YES),
                    PromptOption::new("No", HOMEWORK_NO),
                ],
            ),
            Step::AwaitingHomeworkText => Prompt::free_text(HOMEWORK_TEXT),
            Step::AwaitingRemarks => Prompt::free_text(REMARKS_TEXT),
            Step::Rendering => self.generating(),
        }
    }

    pub fn generating(&self) -> Prompt {
        Prompt::status(GENERATING_TEXT)
    }

    pub fn failure(&self) -> Prompt {
        Prompt::status(FAILURE_TEXT)
    }

    pub fn restart(&self) -> Prompt {
        Prompt::choice(
            RESTART_TEXT,
            ChoiceKind::Restart,
            vec![PromptOption::new(RESTART_LABEL, "again")],
        )
    }

    /// Caption attached to a rendered diary
    pub fn caption(class: &str, subject: &str) -> String {
        format!("Here is your diary for {subject} ({class}).")
    }
}

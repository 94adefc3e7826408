//! The two request shapes the render service understands

use crate::catalog::Field;
use crate::state_machine::SessionRecord;

/// A completed form, shaped for one of the two render endpoints.
///
/// The homework branch decides the shape: with homework the request carries
/// `hw` and `remarks`, without it those keys are not sent at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    WithHomework {
        class: String,
        subject: String,
        cw: String,
        hw: String,
        remarks: String,
        teacher: String,
    },
    ClassworkOnly {
        class: String,
        subject: String,
        cw: String,
        teacher: String,
    },
}

impl RenderRequest {
    /// Build from a record whose form is complete.
    ///
    /// Returns the first missing field otherwise. An unset homework flag is
    /// treated as "no homework".
    pub fn from_record(record: &SessionRecord) -> Result<Self, Field> {
        let get = |field: Field| record.field(field).map(str::to_string).ok_or(field);

        let class = get(Field::Class)?;
        let subject = get(Field::Subject)?;
        let cw = get(Field::Cw)?;
        let teacher = get(Field::Teacher)?;

        if record.has_homework == Some(true) {
            Ok(Self::WithHomework {
                class,
                subject,
                cw,
                hw: get(Field::Hw)?,
                remarks: get(Field::Remarks)?,
                teacher,
            })
        } else {
            Ok(Self::ClassworkOnly {
                class,
                subject,
                cw,
                teacher,
            })
        }
    }

    pub fn has_homework(&self) -> bool {
        matches!(self, Self::WithHomework { .. })
    }

    /// Short name for logs
    pub fn shape(&self) -> &'static str {
        match self {
            Self::WithHomework { .. } => "with_homework",
            Self::ClassworkOnly { .. } => "classwork_only",
        }
    }

    pub fn class(&self) -> &str {
        match self {
            Self::WithHomework { class, .. } | Self::ClassworkOnly { class, .. } => class,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Self::WithHomework { subject, .. } | Self::ClassworkOnly { subject, .. } => subject,
        }
    }

    /// Query parameters in the order the service documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::WithHomework {
                class,
                subject,
                cw,
                hw,
                remarks,
                teacher,
            } => vec![
                (Field::Class.key(), class.as_str()),
                (Field::Subject.key(), subject.as_str()),
                (Field::Cw.key(), cw.as_str()),
                (Field::Hw.key(), hw.as_str()),
                (Field::Remarks.key(), remarks.as_str()),
                (Field::Teacher.key(), teacher.as_str()),
            ],
            Self::ClassworkOnly {
                class,
                subject,
                cw,
                teacher,
            } => vec![
                (Field::Class.key(), class.as_str()),
                (Field::Subject.key(), subject.as_str()),
                (Field::Cw.key(), cw.as_str()),
                (Field::Teacher.key(), teacher.as_str()),
            ],
        }
    }
}

//! Task domain model
//!
//! A task is a single to-do item. Raw caller input arrives as a [`TaskDraft`]
//! (for new tasks) or a [`TaskPatch`] (for edits) and is validated field by
//! field before it can become part of a [`Task`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::date::{DateError, DueDate};
use super::id::{IdError, TaskId};

/// The six fields of a task record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Title,
    Due,
    Priority,
    Group,
    Done,
}

impl Field {
    /// All fields, in persisted order
    pub const ALL: [Field; 6] = [
        Field::Id,
        Field::Title,
        Field::Due,
        Field::Priority,
        Field::Group,
        Field::Done,
    ];

    /// Returns the key used for this field in the task file
    pub fn key(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Title => "title",
            Field::Due => "due",
            Field::Priority => "priority",
            Field::Group => "group",
            Field::Done => "done",
        }
    }

    /// Looks up a field by its key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validation failure for a single field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Id(#[from] IdError),

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("{0} must not contain control characters other than newline")]
    ControlCharacter(Field),

    #[error(transparent)]
    Due(#[from] DateError),

    #[error("Unknown priority '{0}': expected one of low, mid, high")]
    UnknownPriority(String),
}

impl ValidationError {
    /// Returns the field that failed validation
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Id(_) => Field::Id,
            ValidationError::EmptyTitle => Field::Title,
            ValidationError::ControlCharacter(field) => *field,
            ValidationError::Due(_) => Field::Due,
            ValidationError::UnknownPriority(_) => Field::Priority,
        }
    }
}

/// Priority of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Mid,
    High,
}

impl Priority {
    /// Returns the persisted token for this priority
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Mid => "mid",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    /// Case-sensitive: only `low`, `mid` and `high` are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "mid" => Ok(Priority::Mid),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

fn reject_control_chars(value: &str, field: Field) -> Result<(), ValidationError> {
    if value.chars().any(|c| c.is_control() && c != '\n') {
        return Err(ValidationError::ControlCharacter(field));
    }
    Ok(())
}

/// Checks a title: non-empty after trimming, no control characters but newline
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    reject_control_chars(title, Field::Title)
}

/// Checks a group label. Empty means "ungrouped" and is allowed.
pub fn validate_group(group: &str) -> Result<(), ValidationError> {
    reject_control_chars(group, Field::Group)
}

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub due: DueDate,
    pub priority: Priority,
    /// Empty string means the task is ungrouped
    pub group: String,
    pub done: bool,
}

impl Task {
    /// Returns true if this task is unfinished and due strictly before `reference`
    pub fn is_overdue_on(&self, reference: &DueDate) -> bool {
        !self.done && self.due < *reference
    }

    /// Returns true if the task has no group
    pub fn is_ungrouped(&self) -> bool {
        self.group.is_empty()
    }
}

/// Caller-supplied fields for a new task, not yet validated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub due: String,
    pub priority: String,
    pub group: String,
    pub done: bool,
}

impl TaskDraft {
    /// Creates a draft for an unfinished, ungrouped task
    pub fn new(
        title: impl Into<String>,
        due: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            due: due.into(),
            priority: priority.into(),
            group: String::new(),
            done: false,
        }
    }

    /// Sets the group
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets the completion flag
    pub fn done(mut self, done: bool) -> Self {
        self.done = done;
        self
    }

    /// Validates every field and builds a task with the given ID.
    ///
    /// Fields are checked in the order title, due, priority, group; the first
    /// failure is returned.
    pub fn validate(self, id: TaskId) -> Result<Task, ValidationError> {
        validate_title(&self.title)?;
        let due: DueDate = self.due.parse()?;
        let priority: Priority = self.priority.parse()?;
        validate_group(&self.group)?;

        Ok(Task {
            id,
            title: self.title,
            due,
            priority,
            group: self.group,
            done: self.done,
        })
    }
}

/// Validates a complete set of raw fields, including the textual ID
pub fn validate_task(id: &str, draft: TaskDraft) -> Result<Task, ValidationError> {
    let id: TaskId = id.parse()?;
    draft.validate(id)
}

/// A partial edit: only the fields that are `Some` are changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub group: Option<String>,
    pub done: Option<bool>,
}

/// Result of applying a patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Fields that passed validation and were written
    pub applied: Vec<Field>,
    /// Fields that failed validation and were left untouched
    pub rejected: Vec<ValidationError>,
}

impl PatchOutcome {
    /// Returns true if the task was modified
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

impl TaskPatch {
    /// Returns true if the patch carries no fields
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due.is_none()
            && self.priority.is_none()
            && self.group.is_none()
            && self.done.is_none()
    }

    /// Applies each supplied field that validates; a failing field is
    /// reported and skipped without affecting the others
    pub fn apply_to(self, task: &mut Task) -> PatchOutcome {
        let mut outcome = PatchOutcome::default();

        if let Some(title) = self.title {
            match validate_title(&title) {
                Ok(()) => {
                    task.title = title;
                    outcome.applied.push(Field::Title);
                }
                Err(e) => outcome.rejected.push(e),
            }
        }

        if let Some(due) = self.due {
            match due.parse::<DueDate>() {
                Ok(due) => {
                    task.due = due;
                    outcome.applied.push(Field::Due);
                }
                Err(e) => outcome.rejected.push(e.into()),
            }
        }

        if let Some(priority) = self.priority {
            match priority.parse::<Priority>() {
                Ok(priority) => {
                    task.priority = priority;
                    outcome.applied.push(Field::Priority);
                }
                Err(e) => outcome.rejected.push(e),
            }
        }

        if let Some(group) = self.group {
            match validate_group(&group) {
                Ok(()) => {
                    task.group = group;
                    outcome.applied.push(Field::Group);
                }
                Err(e) => outcome.rejected.push(e),
            }
        }

        if let Some(done) = self.done {
            task.done = done;
            outcome.applied.push(Field::Done);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task() -> Task {
        TaskDraft::new("Buy milk", "2025-12-25", "low")
            .validate(TaskId::FIRST)
            .unwrap()
    }

    #[test]
    fn priority_parses_known_tokens() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("mid".parse::<Priority>().unwrap(), Priority::Mid);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
    }

    #[test]
    fn priority_is_case_sensitive_and_never_defaults() {
        for token in ["Low", "HIGH", "medium", "", " low"] {
            assert_eq!(
                token.parse::<Priority>(),
                Err(ValidationError::UnknownPriority(token.to_string()))
            );
        }
    }

    #[test]
    fn priority_serializes_as_token() {
        assert_eq!(serde_json::to_string(&Priority::Mid).unwrap(), "\"mid\"");
        assert_eq!(Priority::High.to_string(), "high");
    }

    #[test]
    fn draft_validates_into_task() {
        let task = TaskDraft::new("Buy milk", "2025-12-25", "low")
            .group("home")
            .done(true)
            .validate(TaskId::FIRST)
            .unwrap();

        assert_eq!(task.id, TaskId::FIRST);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.due.to_string(), "2025-12-25");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.group, "home");
        assert!(task.done);
    }

    #[test]
    fn validate_task_names_the_failing_field() {
        let good = TaskDraft::new("Title", "2025-12-25", "mid");

        let err = validate_task("0", good.clone()).unwrap_err();
        assert_eq!(err.field(), Field::Id);

        let err = validate_task("1", TaskDraft { title: "  ".into(), ..good.clone() }).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
        assert_eq!(err.field(), Field::Title);

        let err = validate_task("1", TaskDraft { due: "2025-02-30".into(), ..good.clone() }).unwrap_err();
        assert_eq!(err.field(), Field::Due);

        let err = validate_task("1", TaskDraft { priority: "urgent".into(), ..good.clone() }).unwrap_err();
        assert_eq!(err.field(), Field::Priority);

        let err = validate_task("1", good.clone().group("a\tb")).unwrap_err();
        assert_eq!(err, ValidationError::ControlCharacter(Field::Group));

        assert!(validate_task("3", good).is_ok());
    }

    #[test]
    fn titles_may_contain_newlines_and_quotes() {
        assert!(validate_title("line one\nline \"two\" \\ three").is_ok());
        assert!(validate_title("tab\there").is_err());
    }

    #[test]
    fn patch_applies_only_supplied_fields() {
        let mut task = make_task();
        let outcome = TaskPatch {
            group: Some("work".into()),
            done: Some(true),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);

        assert_eq!(outcome.applied, vec![Field::Group, Field::Done]);
        assert!(outcome.rejected.is_empty());
        assert_eq!(task.group, "work");
        assert!(task.done);
        assert_eq!(task.title, "Buy milk");
    }

    #[test]
    fn patch_skips_invalid_fields_and_continues() {
        let mut task = make_task();
        let outcome = TaskPatch {
            title: Some("Buy oat milk".into()),
            due: Some("2025-02-30".into()),
            priority: Some("urgent".into()),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);

        assert_eq!(outcome.applied, vec![Field::Title]);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.rejected[0].field(), Field::Due);
        assert_eq!(outcome.rejected[1].field(), Field::Priority);

        assert_eq!(task.title, "Buy oat milk");
        assert_eq!(task.due.to_string(), "2025-12-25");
        assert_eq!(task.priority, Priority::Low);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut task = make_task();
        let before = task.clone();
        let patch = TaskPatch::default();

        assert!(patch.is_empty());
        let outcome = patch.apply_to(&mut task);
        assert!(!outcome.changed());
        assert_eq!(task, before);
    }

    #[test]
    fn overdue_ignores_finished_tasks() {
        let mut task = make_task();
        let reference: DueDate = "2025-12-26".parse().unwrap();
        assert!(task.is_overdue_on(&reference));

        task.done = true;
        assert!(!task.is_overdue_on(&reference));
    }

    #[test]
    fn field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("status"), None);
    }
}

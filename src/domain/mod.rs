//! Domain models for taskbook
//!
//! Contains the task model and its validation rules without any I/O concerns.

mod date;
mod id;
mod task;

pub use date::{days_in_month, is_leap_year, is_overdue, is_valid_date, today, DateError, DueDate};
pub use id::{IdError, TaskId};
pub use task::{
    validate_group, validate_task, validate_title, Field, PatchOutcome, Priority, Task, TaskDraft,
    TaskPatch, ValidationError,
};

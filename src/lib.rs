//! taskbook - A personal task tracker backed by a single JSON file
//!
//! Tasks carry a title, a due date, a priority, an optional group and a
//! completion flag. The whole list lives in one human-readable file that is
//! loaded leniently and rewritten on every change.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{DueDate, Priority, Task, TaskDraft, TaskId, TaskPatch};
pub use storage::{TaskBook, TaskStore};

//! The task collection and its operations
//!
//! [`TaskBook`] owns the tasks in file order and the [`TaskStore`] they came
//! from. Every successful mutation rewrites the store; if the rewrite fails
//! the mutation is undone in memory too, so the collection always matches the
//! last state that was written (or loaded).
//!
//! Edits and deletions address tasks by their 1-based position in the list,
//! not by ID. IDs stay attached to their tasks and are never renumbered.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::format::LoadWarning;
use super::task_store::{StoreError, TaskStore};
use crate::domain::{DueDate, Field, Task, TaskDraft, TaskId, TaskPatch, ValidationError};

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("No task at position {index}: positions run from 1 to {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("No task IDs left to assign")]
    IdsExhausted,

    #[error("Task file {} could not be read; changes are not saved so it is not overwritten", path.display())]
    Unloaded { path: PathBuf },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A task together with its 1-based position in the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entry<'a> {
    pub position: usize,
    #[serde(flatten)]
    pub task: &'a Task,
}

/// Tasks whose group matched a filter. Empty means the group was not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub group: String,
    pub entries: Vec<Entry<'a>>,
}

impl Selection<'_> {
    /// Returns true if at least one task is in the group
    pub fn found(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Unfinished tasks due before a reference date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueReport<'a> {
    /// The parsed reference date, None if it was not a valid date
    pub reference: Option<DueDate>,
    pub entries: Vec<Entry<'a>>,
}

impl OverdueReport<'_> {
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

/// Result of a successful update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The task as it is after the update
    pub task: Task,
    pub applied: Vec<Field>,
    pub rejected: Vec<ValidationError>,
}

/// An ordered, file-backed collection of tasks
#[derive(Debug)]
pub struct TaskBook {
    store: TaskStore,
    tasks: Vec<Task>,
    /// False when the store could not be read; saving would clobber it
    writable: bool,
}

impl TaskBook {
    /// Loads the book from its store, returning any load warnings
    pub fn open(store: TaskStore) -> Result<(Self, Vec<LoadWarning>), StoreError> {
        let report = store.load()?;
        Ok((
            Self {
                store,
                tasks: report.tasks,
                writable: true,
            },
            report.warnings,
        ))
    }

    /// Creates an empty book backed by `store` without reading it
    pub fn empty(store: TaskStore) -> Self {
        Self {
            store,
            tasks: Vec::new(),
            writable: true,
        }
    }

    /// Creates an empty book for a store that failed to load.
    ///
    /// Queries work on the empty list; every mutation fails with
    /// [`BookError::Unloaded`] and the file on disk is left alone.
    pub fn unloaded(store: TaskStore) -> Self {
        Self {
            writable: false,
            ..Self::empty(store)
        }
    }

    /// Returns false if mutations are refused because the store was unreadable
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn check_writable(&self) -> Result<(), BookError> {
        if !self.writable {
            return Err(BookError::Unloaded {
                path: self.store.path().to_path_buf(),
            });
        }
        Ok(())
    }

    /// Returns the backing store
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the task at a 1-based position
    pub fn get(&self, position: usize) -> Option<&Task> {
        position.checked_sub(1).and_then(|i| self.tasks.get(i))
    }

    /// Returns all tasks in file order
    pub fn list_all(&self) -> Vec<Entry<'_>> {
        self.entries().collect()
    }

    fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.tasks.iter().enumerate().map(|(i, task)| Entry {
            position: i + 1,
            task,
        })
    }

    fn check_position(&self, index: usize) -> Result<usize, BookError> {
        if index == 0 || index > self.tasks.len() {
            return Err(BookError::OutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        Ok(index - 1)
    }

    /// Returns the ID the next created task will get
    pub fn next_id(&self) -> Option<TaskId> {
        TaskId::next_after(self.tasks.iter().map(|t| t.id))
    }

    /// Validates and appends a new task, then saves
    pub fn create(&mut self, draft: TaskDraft) -> Result<&Task, BookError> {
        self.check_writable()?;
        let id = self.next_id().ok_or(BookError::IdsExhausted)?;
        let task = draft.validate(id)?;

        self.tasks.push(task);
        if let Err(e) = self.store.save_all(&self.tasks) {
            self.tasks.pop();
            return Err(e.into());
        }

        let index = self.tasks.len() - 1;
        Ok(&self.tasks[index])
    }

    /// Applies the valid fields of `patch` to the task at `index` (1-based).
    ///
    /// Invalid fields are returned in the outcome and leave the task as it
    /// was; the store is only rewritten when something changed.
    pub fn update(&mut self, index: usize, patch: TaskPatch) -> Result<UpdateOutcome, BookError> {
        self.check_writable()?;
        let i = self.check_position(index)?;

        let mut task = self.tasks[i].clone();
        let patched = patch.apply_to(&mut task);

        if patched.changed() {
            let previous = std::mem::replace(&mut self.tasks[i], task.clone());
            if let Err(e) = self.store.save_all(&self.tasks) {
                self.tasks[i] = previous;
                return Err(e.into());
            }
        }

        Ok(UpdateOutcome {
            task: self.tasks[i].clone(),
            applied: patched.applied,
            rejected: patched.rejected,
        })
    }

    /// Removes the task at `index` (1-based), then saves
    pub fn delete(&mut self, index: usize) -> Result<Task, BookError> {
        self.check_writable()?;
        let i = self.check_position(index)?;

        let removed = self.tasks.remove(i);
        if let Err(e) = self.store.save_all(&self.tasks) {
            self.tasks.insert(i, removed);
            return Err(e.into());
        }

        Ok(removed)
    }

    /// Returns the tasks whose group equals `name` exactly, in order
    pub fn filter_by_group(&self, name: &str) -> Selection<'_> {
        Selection {
            group: name.to_string(),
            entries: self.entries().filter(|e| e.task.group == name).collect(),
        }
    }

    /// Returns unfinished tasks due strictly before `reference` (`YYYY-MM-DD`).
    ///
    /// A reference that is not a valid date matches nothing.
    pub fn overdue_report(&self, reference: &str) -> OverdueReport<'_> {
        let reference = reference.parse::<DueDate>().ok();
        let entries = match &reference {
            Some(date) => self.entries().filter(|e| e.task.is_overdue_on(date)).collect(),
            None => Vec::new(),
        };

        OverdueReport { reference, entries }
    }
}

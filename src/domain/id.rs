//! Task identifiers
//!
//! IDs are positive integers, persisted as decimal strings (`"id": "3"`).
//! New IDs are handed out as one past the largest ID in the collection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid task ID: expected a positive integer, got '{0}'")]
    NotAnInteger(String),

    #[error("Invalid task ID: IDs start at 1, got '{0}'")]
    NotPositive(String),
}

/// Task ID, a positive integer unique within one task file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(NonZeroU32);

impl TaskId {
    /// The ID given to the first task of an empty collection
    pub const FIRST: TaskId = TaskId(NonZeroU32::MIN);

    /// Creates an ID from a raw value, `None` for zero
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    /// Returns the numeric value
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns the following ID, or None once the ID space is used up
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Returns the ID a new task should get, given the IDs already in use
    pub fn next_after<I>(existing: I) -> Option<Self>
    where
        I: IntoIterator<Item = TaskId>,
    {
        match existing.into_iter().max() {
            Some(max) => max.next(),
            None => Some(Self::FIRST),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        // Negative numbers get the more helpful message
        if let Some(rest) = trimmed.strip_prefix('-') {
            if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                return Err(IdError::NotPositive(s.to_string()));
            }
        }

        let value: u32 = trimmed
            .parse()
            .map_err(|_| IdError::NotAnInteger(s.to_string()))?;

        Self::new(value).ok_or_else(|| IdError::NotPositive(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

//! # Storage Layer
//!
//! Persistence and the operations on the task collection.
//!
//! ## Storage Format
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | Pretty-printed JSON array | `data.json` (or `--file`) |
//! | Config | TOML | `~/.config/taskbook/config.toml` |
//!
//! ## Write Safety
//!
//! - [`TaskStore`] rewrites the whole file on every save (temp file + rename)
//! - Reads take a shared `fs2` lock, writes an exclusive one
//! - [`TaskBook`] undoes an in-memory change when its save fails
//!
//! ## Key Types
//!
//! - [`TaskBook`] - The task collection: create, update, delete, queries
//! - [`TaskStore`] - Load/save of one task file
//! - [`LoadReport`] - Tasks plus warnings from a lenient load
//! - [`Config`] - User configuration

mod book;
mod config;
mod format;
mod task_store;

pub use book::{BookError, Entry, OverdueReport, Selection, TaskBook, UpdateOutcome};
pub use config::{Config, ConfigError, CONFIG_ENV, DEFAULT_DATA_FILE};
pub use format::{escape, parse, render, LoadReport, LoadWarning, WarningKind};
pub use task_store::{StoreError, TaskStore};

//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | (none), `menu` | Interactive numbered menu |
//! | `add` | Create a task |
//! | `list` | Show all tasks with their positions |
//! | `edit <#>` | Change fields of a task |
//! | `delete <#>` | Remove a task |
//! | `group <name>` | Tasks of one group |
//! | `overdue` | Unfinished tasks past their due date |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! taskbook --verbose list
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod menu;
mod output;
mod task;

pub use app::{run, Cli, Commands};
pub use menu::Menu;
pub use output::{write_task_table, Output, OutputFormat};

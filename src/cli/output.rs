//! Output formatting for CLI commands

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::storage::Entry;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints an error message
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Error: {}", message),
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "error": message
                    })
                );
            }
        }
    }

    /// Prints a warning that does not stop the command
    pub fn warn(&self, message: &str) {
        match self.format {
            OutputFormat::Text => eprintln!("Warning: {}", message),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({ "warning": message }));
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // For text format, we expect the caller to handle it
                // This is a fallback that pretty-prints JSON
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

/// Writes tasks as an aligned text table
pub fn write_task_table<W: Write>(out: &mut W, entries: &[Entry<'_>]) -> io::Result<()> {
    writeln!(
        out,
        "{:<4} {:<6} {:<8} {:<10} {:<5} {:<12} TITLE",
        "#", "ID", "PRIORITY", "DUE", "DONE", "GROUP"
    )?;
    writeln!(out, "{}", "-".repeat(72))?;

    for entry in entries {
        let task = entry.task;
        let group = if task.is_ungrouped() { "-" } else { task.group.as_str() };
        writeln!(
            out,
            "{:<4} {:<6} {:<8} {:<10} {:<5} {:<12} {}",
            entry.position,
            task.id.to_string(),
            task.priority.as_str(),
            task.due.to_string(),
            if task.done { "yes" } else { "no" },
            group,
            task.title.replace('\n', " / ")
        )?;
    }

    Ok(())
}

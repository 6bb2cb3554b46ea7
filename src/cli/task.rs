//! Task CLI commands
//!
//! One function per subcommand. Each works on an already opened
//! [`TaskBook`]; positions are the 1-based `#` column of `list`.

use std::io;

use anyhow::{bail, Result};

use super::output::{write_task_table, Output};
use crate::domain::{today, DueDate, Task, TaskDraft, TaskPatch};
use crate::storage::{Entry, TaskBook};

fn print_table(entries: &[Entry<'_>]) -> Result<()> {
    write_task_table(&mut io::stdout().lock(), entries)?;
    Ok(())
}

fn entry_json(position: usize, task: &Task) -> serde_json::Value {
    serde_json::json!(Entry { position, task })
}

pub fn add(book: &mut TaskBook, output: &Output, draft: TaskDraft) -> Result<()> {
    output.verbose_ctx("add", &format!("Next ID: {:?}", book.next_id().map(|id| id.get())));

    let task = book.create(draft)?.clone();
    let position = book.len();

    if output.is_json() {
        output.data(&entry_json(position, &task));
    } else {
        output.success(&format!("Created task {}: {}", task.id, task.title));
    }

    Ok(())
}

pub fn list(book: &TaskBook, output: &Output) -> Result<()> {
    let entries = book.list_all();

    if output.is_json() {
        output.data(&entries);
    } else if entries.is_empty() {
        println!("No tasks");
    } else {
        print_table(&entries)?;
    }

    Ok(())
}

pub fn edit(book: &mut TaskBook, output: &Output, position: usize, patch: TaskPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to change: pass at least one of --title, --due, --priority, --group, --done");
    }

    let outcome = book.update(position, patch)?;
    output.verbose_ctx(
        "edit",
        &format!("applied={:?} rejected={}", outcome.applied, outcome.rejected.len()),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": entry_json(position, &outcome.task),
            "applied": outcome.applied.iter().map(|f| f.key()).collect::<Vec<_>>(),
            "rejected": outcome
                .rejected
                .iter()
                .map(|e| serde_json::json!({ "field": e.field().key(), "error": e.to_string() }))
                .collect::<Vec<_>>(),
        }));
    } else {
        for rejected in &outcome.rejected {
            output.warn(&format!("{} not changed: {}", rejected.field(), rejected));
        }
    }

    if outcome.applied.is_empty() {
        bail!("No changes applied to task {}", outcome.task.id);
    }

    if !output.is_json() {
        output.success(&format!("Updated task {}: {}", outcome.task.id, outcome.task.title));
    }

    Ok(())
}

pub fn delete(book: &mut TaskBook, output: &Output, position: usize) -> Result<()> {
    let task = book.delete(position)?;

    if output.is_json() {
        output.data(&entry_json(position, &task));
    } else {
        output.success(&format!("Deleted task {}: {}", task.id, task.title));
    }

    Ok(())
}

pub fn group(book: &TaskBook, output: &Output, name: &str) -> Result<()> {
    let selection = book.filter_by_group(name);

    if output.is_json() {
        output.data(&serde_json::json!({
            "group": selection.group,
            "found": selection.found(),
            "tasks": selection.entries,
        }));
    } else if !selection.found() {
        println!("No tasks found in group '{}'", name);
    } else {
        print_table(&selection.entries)?;
    }

    Ok(())
}

pub fn overdue(book: &TaskBook, output: &Output, reference: Option<&str>) -> Result<()> {
    let reference: DueDate = match reference {
        Some(text) => text.parse()?,
        None => today()?,
    };
    output.verbose_ctx("overdue", &format!("Reference date: {}", reference));

    let report = book.overdue_report(&reference.to_string());

    if output.is_json() {
        output.data(&serde_json::json!({
            "reference": reference,
            "count": report.count(),
            "tasks": report.entries,
        }));
    } else if report.count() == 0 {
        println!("No overdue tasks as of {}", reference);
    } else {
        print_table(&report.entries)?;
        println!();
        println!("Overdue tasks: {}", report.count());
    }

    Ok(())
}

//! Interactive numbered menu
//!
//! The menu only collects input and renders results. Each value is checked
//! with the domain validators; create re-prompts until a value is accepted,
//! edit reports a rejected value and moves on to the next field.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::output::{write_task_table, Output};
use crate::domain::{
    today, validate_group, validate_title, DueDate, Priority, TaskDraft, TaskPatch,
    ValidationError,
};
use crate::storage::TaskBook;

/// Whether the session goes on after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

/// Runs the menu on stdin/stdout until the user leaves
pub fn run(book: &mut TaskBook, output: &Output) -> Result<()> {
    let today = today()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(book, output, stdin.lock(), stdout.lock(), today).run()
}

pub struct Menu<'a, R, W> {
    book: &'a mut TaskBook,
    output: &'a Output,
    input: R,
    out: W,
    today: DueDate,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(book: &'a mut TaskBook, output: &'a Output, input: R, out: W, today: DueDate) -> Self {
        Self {
            book,
            output,
            input,
            out,
            today,
        }
    }

    /// Shows the menu until input ends or a non-menu choice is entered
    pub fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.out)?;
            writeln!(self.out, "Choose an action:")?;
            writeln!(self.out, "    1 - create a task")?;
            writeln!(self.out, "    2 - delete a task")?;
            writeln!(self.out, "    3 - edit a task")?;
            writeln!(self.out, "    4 - filter by group")?;
            writeln!(self.out, "    5 - overdue report")?;
            writeln!(self.out, "    6 - list all tasks")?;
            writeln!(self.out, "    anything else - exit")?;
            self.out.flush()?;

            let Some(choice) = self.read_line()? else {
                return Ok(());
            };
            self.output.verbose_ctx("menu", &format!("choice: {:?}", choice));

            let step = match choice.as_str() {
                "1" => self.create()?,
                "2" => self.delete()?,
                "3" => self.edit()?,
                "4" => self.filter()?,
                "5" => self.overdue()?,
                "6" => self.list()?,
                _ => {
                    writeln!(self.out, "Goodbye.")?;
                    return Ok(());
                }
            };

            if step == Step::Exit {
                return Ok(());
            }
        }
    }

    /// Reads one trimmed line, None at end of input
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        self.read_line()
    }

    /// Prompts until `check` accepts the answer
    fn prompt_until<T>(
        &mut self,
        text: &str,
        check: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Result<Option<String>> {
        loop {
            let Some(answer) = self.prompt(text)? else {
                return Ok(None);
            };
            match check(&answer) {
                Ok(_) => return Ok(Some(answer)),
                Err(e) => writeln!(self.out, "{}. Please try again.", e)?,
            }
        }
    }

    /// Asks a y/n question until answered
    fn confirm(&mut self, question: &str) -> Result<Option<bool>> {
        loop {
            let Some(answer) = self.prompt(&format!("{} (y/n)", question))? else {
                return Ok(None);
            };
            match answer.as_str() {
                "y" => return Ok(Some(true)),
                "n" => return Ok(Some(false)),
                _ => writeln!(self.out, "Please answer y or n.")?,
            }
        }
    }

    /// Prompts for a 1-based position of an existing task
    fn position(&mut self, verb: &str) -> Result<Option<Option<usize>>> {
        let Some(answer) = self.prompt(&format!("Enter the position (#) of the task to {}:", verb))?
        else {
            return Ok(None);
        };

        let position = answer
            .parse::<usize>()
            .ok()
            .filter(|p| self.book.get(*p).is_some());
        if position.is_none() {
            writeln!(self.out, "There is no task at position '{}'.", answer)?;
        }
        Ok(Some(position))
    }

    fn show_all(&mut self) -> Result<()> {
        write_task_table(&mut self.out, &self.book.list_all())?;
        Ok(())
    }

    fn create(&mut self) -> Result<Step> {
        writeln!(self.out, "Creating a new task.")?;

        let Some(priority) =
            self.prompt_until("Enter priority (low, mid, high):", |s| s.parse::<Priority>())?
        else {
            return Ok(Step::Exit);
        };
        let Some(title) = self.prompt_until("Enter title:", validate_title)? else {
            return Ok(Step::Exit);
        };
        let Some(due) = self.prompt_until("Enter due date (YYYY-MM-DD):", |s| {
            s.parse::<DueDate>().map_err(ValidationError::from)
        })?
        else {
            return Ok(Step::Exit);
        };
        let Some(group) =
            self.prompt_until("Enter group (leave empty for none):", validate_group)?
        else {
            return Ok(Step::Exit);
        };

        let draft = TaskDraft::new(title, due, priority).group(group);
        match self.book.create(draft) {
            Ok(task) => writeln!(self.out, "Created task {}: {}", task.id, task.title)?,
            Err(e) => writeln!(self.out, "Error: {:#}", anyhow::Error::from(e))?,
        }
        Ok(Step::Continue)
    }

    fn delete(&mut self) -> Result<Step> {
        if self.book.is_empty() {
            writeln!(self.out, "Nothing to delete, add a task first.")?;
            return Ok(Step::Continue);
        }

        self.show_all()?;
        let Some(position) = self.position("delete")? else {
            return Ok(Step::Exit);
        };
        let Some(position) = position else {
            return Ok(Step::Continue);
        };

        match self.book.delete(position) {
            Ok(task) => writeln!(self.out, "Deleted task {}: {}", task.id, task.title)?,
            Err(e) => writeln!(self.out, "Error: {:#}", anyhow::Error::from(e))?,
        }
        Ok(Step::Continue)
    }

    fn edit(&mut self) -> Result<Step> {
        if self.book.is_empty() {
            writeln!(self.out, "Nothing to edit, add a task first.")?;
            return Ok(Step::Continue);
        }

        self.show_all()?;
        let Some(position) = self.position("edit")? else {
            return Ok(Step::Exit);
        };
        let Some(position) = position else {
            return Ok(Step::Continue);
        };

        let mut patch = TaskPatch::default();
        let text_fields: [(&str, &str, fn(&mut TaskPatch, String)); 4] = [
            ("Change priority?", "Enter priority (low, mid, high):", |p, v| p.priority = Some(v)),
            ("Change due date?", "Enter due date (YYYY-MM-DD):", |p, v| p.due = Some(v)),
            ("Change group?", "Enter group (leave empty for none):", |p, v| p.group = Some(v)),
            ("Change title?", "Enter title:", |p, v| p.title = Some(v)),
        ];

        for (question, request, set) in text_fields {
            match self.confirm(question)? {
                None => return Ok(Step::Exit),
                Some(false) => {}
                Some(true) => {
                    let Some(value) = self.prompt(request)? else {
                        return Ok(Step::Exit);
                    };
                    set(&mut patch, value);
                }
            }
        }

        match self.confirm("Change status?")? {
            None => return Ok(Step::Exit),
            Some(false) => {}
            Some(true) => {
                let Some(done) = self.confirm("Is the task done?")? else {
                    return Ok(Step::Exit);
                };
                patch.done = Some(done);
            }
        }

        match self.book.update(position, patch) {
            Ok(outcome) => {
                for rejected in &outcome.rejected {
                    writeln!(self.out, "Not changed: {}", rejected)?;
                }
                if outcome.applied.is_empty() {
                    writeln!(self.out, "No changes were made.")?;
                } else {
                    writeln!(self.out, "Changes saved.")?;
                }
            }
            Err(e) => writeln!(self.out, "Error: {:#}", anyhow::Error::from(e))?,
        }
        Ok(Step::Continue)
    }

    fn filter(&mut self) -> Result<Step> {
        if self.book.is_empty() {
            writeln!(self.out, "The task list is empty.")?;
            return Ok(Step::Continue);
        }

        let Some(group) = self.prompt("Enter the group to filter by:")? else {
            return Ok(Step::Exit);
        };

        let selection = self.book.filter_by_group(&group);
        if selection.found() {
            write_task_table(&mut self.out, &selection.entries)?;
        } else {
            writeln!(self.out, "No tasks found in group \"{}\".", group)?;
        }
        Ok(Step::Continue)
    }

    fn overdue(&mut self) -> Result<Step> {
        if self.book.is_empty() {
            writeln!(self.out, "The task list is empty.")?;
            return Ok(Step::Continue);
        }

        let request = format!(
            "Enter today's date (YYYY-MM-DD), or leave empty for {}:",
            self.today
        );
        let Some(answer) = self.prompt_until(&request, |s| {
            if s.is_empty() {
                Ok(())
            } else {
                s.parse::<DueDate>().map(|_| ()).map_err(ValidationError::from)
            }
        })?
        else {
            return Ok(Step::Exit);
        };
        let reference = if answer.is_empty() {
            self.today.to_string()
        } else {
            answer
        };

        let report = self.book.overdue_report(&reference);
        if report.count() == 0 {
            writeln!(self.out, "No unfinished overdue tasks.")?;
        } else {
            write_task_table(&mut self.out, &report.entries)?;
            writeln!(self.out, "Overdue tasks: {}", report.count())?;
        }
        Ok(Step::Continue)
    }

    fn list(&mut self) -> Result<Step> {
        if self.book.is_empty() {
            writeln!(self.out, "The task list is empty.")?;
        } else {
            self.show_all()?;
        }
        Ok(Step::Continue)
    }
}

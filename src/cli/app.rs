//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{menu, task};
use crate::domain::{TaskDraft, TaskPatch};
use crate::storage::{Config, TaskBook, TaskStore};

#[derive(Parser)]
#[command(name = "taskbook")]
#[command(author, version, about = "A personal task tracker backed by a JSON file")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Task file (defaults to the configured file, then ./data.json)
    #[arg(long, global = true, env = "TASKBOOK_FILE")]
    pub file: Option<PathBuf>,

    /// Output format (defaults to the configured format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Without a command the interactive menu opens
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive menu
    Menu,

    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Priority: low, mid or high
        #[arg(long, short)]
        priority: String,

        /// Group label (empty for none)
        #[arg(long, short, default_value = "")]
        group: String,

        /// Create the task already completed
        #[arg(long)]
        done: bool,
    },

    /// List all tasks in file order
    List,

    /// Change fields of the task at a position
    Edit {
        /// Position from `list` (1-based)
        position: usize,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// New priority
        #[arg(long, short)]
        priority: Option<String>,

        /// New group (empty string removes it)
        #[arg(long, short)]
        group: Option<String>,

        /// New completion state
        #[arg(long)]
        done: Option<bool>,
    },

    /// Delete the task at a position
    Delete {
        /// Position from `list` (1-based)
        position: usize,
    },

    /// Show the tasks of one group
    Group {
        /// Exact group label
        name: String,
    },

    /// Show unfinished tasks due before a date
    Overdue {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let output = Output::new(cli.format.unwrap_or(config.default_format), cli.verbose);

    output.verbose("taskbook starting");
    if let Some(path) = Config::config_path() {
        output.verbose_ctx("config", &format!("Config file: {}", path.display()));
    }

    let path = config.resolve_data_file(cli.file);
    output.verbose_ctx("store", &format!("Task file: {}", path.display()));
    let store = TaskStore::new(path);

    let command = cli.command.unwrap_or(Commands::Menu);
    let interactive = matches!(command, Commands::Menu);

    let mut book = match TaskBook::open(store.clone()) {
        Ok((book, warnings)) => {
            for warning in &warnings {
                output.warn(&warning.to_string());
            }
            output.verbose_ctx("store", &format!("Loaded {} task(s)", book.len()));
            book
        }
        Err(e) if interactive => {
            output.error(&format!("{:#}", anyhow::Error::from(e)));
            output.warn("Starting with an empty task list; changes will not be saved");
            TaskBook::unloaded(store)
        }
        Err(e) => return Err(e.into()),
    };

    match command {
        Commands::Menu => menu::run(&mut book, &output)?,

        Commands::Add {
            title,
            due,
            priority,
            group,
            done,
        } => {
            let draft = TaskDraft::new(title, due, priority).group(group).done(done);
            task::add(&mut book, &output, draft)?
        }

        Commands::List => task::list(&book, &output)?,

        Commands::Edit {
            position,
            title,
            due,
            priority,
            group,
            done,
        } => {
            let patch = TaskPatch {
                title,
                due,
                priority,
                group,
                done,
            };
            task::edit(&mut book, &output, position, patch)?
        }

        Commands::Delete { position } => task::delete(&mut book, &output, position)?,

        Commands::Group { name } => task::group(&book, &output, &name)?,

        Commands::Overdue { today } => task::overdue(&book, &output, today.as_deref())?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

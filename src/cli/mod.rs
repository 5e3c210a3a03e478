//! Command-line interface for daycard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::{UserProfile, UserStore};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::session::Session;
use crate::storage::{Storage, DATA_DIR_ENV};
use crate::task::TaskStore;

mod auth;
mod board;
mod task;

/// daycard - a personal day planner
///
/// Tasks are dated, timed, and grouped into one card per day, newest first,
/// alongside a streak of consecutive days and a points total.
#[derive(Parser, Debug)]
#[command(name = "daycard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding users, tasks and config
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "DAYCARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in with an existing account
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "DAYCARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Add tasks to a day
    Add {
        /// Day for the tasks, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Tasks as "TEXT" or "HH:MM-HH:MM TEXT"
        #[arg(required = true)]
        tasks: Vec<String>,
    },

    /// Mark a task done, or not done again
    Toggle {
        /// Task ID or unique prefix
        id: String,
    },

    /// Change a task's text or times
    Edit {
        /// Task ID or unique prefix
        id: String,

        #[arg(long)]
        text: Option<String>,

        /// Start time, HH:MM
        #[arg(long)]
        start: Option<String>,

        /// End time, HH:MM
        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a task
    Rm {
        /// Task ID or unique prefix
        id: String,
    },

    /// Show one task
    Show {
        /// Task ID or unique prefix
        id: String,
    },

    /// Print day cards, most recent first
    Cards {
        /// Only days whose YYYY-MM-DD date contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show points, streak and completed totals
    Stats,

    /// Regenerate the task snapshot from the event log
    Rebuild,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let data_dir = self.data_dir;

        match self.command {
            Commands::Signup {
                name,
                email,
                password,
            } => auth::run_signup(auth::SignupOptions {
                name,
                email,
                password,
                data_dir,
                output,
            }),
            Commands::Login { email, password } => auth::run_login(auth::LoginOptions {
                email,
                password,
                data_dir,
                output,
            }),
            Commands::Logout => auth::run_logout(data_dir, output),
            Commands::Whoami => auth::run_whoami(data_dir, output),
            Commands::Add { date, tasks } => task::run_add(task::AddOptions {
                date,
                tasks,
                data_dir,
                output,
            }),
            Commands::Toggle { id } => task::run_toggle(task::IdOptions {
                id,
                data_dir,
                output,
            }),
            Commands::Edit {
                id,
                text,
                start,
                end,
            } => task::run_edit(task::EditOptions {
                id,
                text,
                start,
                end,
                data_dir,
                output,
            }),
            Commands::Rm { id } => task::run_rm(task::IdOptions {
                id,
                data_dir,
                output,
            }),
            Commands::Show { id } => task::run_show(task::IdOptions {
                id,
                data_dir,
                output,
            }),
            Commands::Cards { search } => board::run_cards(board::CardsOptions {
                search,
                data_dir,
                output,
            }),
            Commands::Stats => board::run_stats(data_dir, output),
            Commands::Rebuild => task::run_rebuild(data_dir, output),
        }
    }
}

/// Everything a command needs from the data directory.
pub(crate) struct AppContext {
    pub storage: Storage,
    pub config: Config,
}

impl AppContext {
    pub fn open(data_dir: Option<PathBuf>) -> Self {
        let storage = Storage::resolve(data_dir);
        let config = Config::load_from_dir(storage.data_dir());
        tracing::debug!(data_dir = %storage.data_dir().display(), "opened data dir");
        Self { storage, config }
    }

    pub fn session(&self) -> Session {
        Session::new(self.storage.clone())
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.storage.clone(), self.config.auth.clone())
    }

    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.storage.clone(), self.config.tasks.clone())
    }

    /// The signed-in user, or `NotSignedIn`.
    pub fn user(&self) -> Result<UserProfile> {
        self.session().require()
    }
}

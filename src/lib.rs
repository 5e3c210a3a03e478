//! daycard - personal day planner library
//!
//! This library provides the core functionality for the daycard CLI:
//! users sign in, add dated and timed tasks, and see them grouped into
//! one card per calendar day.
//!
//! # Core Concepts
//!
//! - **Day cards**: all of a user's tasks on one date, newest day first
//! - **Streak**: consecutive days, ending at the latest card, that have tasks
//! - **Points**: how many tasks a user has recorded
//!
//! # Module Organization
//!
//! - `board`: Day-card view model, metrics and dashboard load state
//! - `task`: Event-sourced task store
//! - `auth`: User registry, sign-up and sign-in
//! - `session`: Signed-in user persistence
//! - `cli`: Command-line interface using clap
//! - `output`: Human and JSON output envelopes
//! - `config`: Configuration loading from `daycard.toml`
//! - `storage`: Data directory layout and JSON/JSONL I/O
//! - `lock`: File locking and atomic writes
//! - `error`: Error types and result aliases

pub mod auth;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod session;
pub mod storage;
pub mod task;

pub use error::{Error, Result};

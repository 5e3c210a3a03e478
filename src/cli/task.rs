//! daycard task command implementations.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::board::{format_card_date, Dashboard};
use crate::cli::board::format_task_line;
use crate::cli::AppContext;
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{TaskDraft, TaskPatch, TaskRebuildReport, TaskRecord};

pub struct AddOptions {
    pub date: Option<String>,
    pub tasks: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct EditOptions {
    pub id: String,
    pub text: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

/// Options for commands that take a single task id
pub struct IdOptions {
    pub id: String,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskChangeReport {
    action: &'static str,
    tasks: Vec<TaskRecord>,
    points: usize,
    streak: u32,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let date = match options.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };
    let drafts = options
        .tasks
        .iter()
        .map(|raw| parse_task_arg(raw, store.config()))
        .collect::<Result<Vec<_>>>()?;

    let created = store.create_batch(&user.id, date, drafts)?;
    let skipped = options.tasks.len().saturating_sub(created.len());

    let mut dashboard = Dashboard::new(user);
    let board = dashboard.refresh(&store)?;

    let mut human = HumanOutput::new(format!(
        "Added {} task(s) to {}",
        created.len(),
        format_card_date(date)
    ));
    for task in &created {
        human.push_summary(format_task_line(task), "");
    }
    human.push_summary("points", board.points.to_string());
    human.push_summary("streak", board.streak.to_string());
    if skipped > 0 {
        human.push_warning(format!("skipped {skipped} task(s) with no text"));
    }
    human.push_next_step("daycard cards");

    let report = TaskChangeReport {
        action: "added",
        points: board.points,
        streak: board.streak,
        tasks: created,
    };
    emit_success(options.output, "add", &report, Some(&human))
}

pub fn run_toggle(options: IdOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let id = store.resolve_id(&user.id, &options.id)?;
    let record = store.toggle(&user.id, &id)?;

    let mut dashboard = Dashboard::new(user);
    let board = dashboard.refresh(&store)?;

    let header = if record.completed {
        "Task done"
    } else {
        "Task reopened"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary(format_task_line(&record), "");
    human.push_summary("completed", board.completed.to_string());

    let report = TaskChangeReport {
        action: "toggled",
        points: board.points,
        streak: board.streak,
        tasks: vec![record],
    };
    emit_success(options.output, "toggle", &report, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let id = store.resolve_id(&user.id, &options.id)?;
    let patch = TaskPatch {
        text: options.text,
        start_time: options.start,
        end_time: options.end,
    };
    let record = store.update(&user.id, &id, patch)?;

    let mut dashboard = Dashboard::new(user);
    let board = dashboard.refresh(&store)?;

    let mut human = HumanOutput::new("Task updated");
    human.push_summary(format_task_line(&record), "");
    human.push_summary("date", format_card_date(record.date));

    let report = TaskChangeReport {
        action: "updated",
        points: board.points,
        streak: board.streak,
        tasks: vec![record],
    };
    emit_success(options.output, "edit", &report, Some(&human))
}

pub fn run_rm(options: IdOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let id = store.resolve_id(&user.id, &options.id)?;
    let removed = store.delete(&user.id, &id)?;

    let mut dashboard = Dashboard::new(user);
    let board = dashboard.refresh(&store)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary(format_task_line(&removed), "");
    human.push_summary("points", board.points.to_string());
    human.push_summary("streak", board.streak.to_string());

    let report = TaskChangeReport {
        action: "deleted",
        points: board.points,
        streak: board.streak,
        tasks: vec![removed],
    };
    emit_success(options.output, "rm", &report, Some(&human))
}

pub fn run_show(options: IdOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let id = store.resolve_id(&user.id, &options.id)?;
    let record = store.get(&user.id, &id)?;

    let mut human = HumanOutput::new(format!("Task {}", record.id));
    human.push_summary("text", record.text.clone());
    human.push_summary("date", format_card_date(record.date));
    human.push_summary("start", record.start_time.clone());
    human.push_summary("end", record.end_time.clone());
    human.push_summary("completed", record.completed.to_string());
    human.push_summary("updated", record.updated_at.to_rfc3339());

    emit_success(options.output, "show", &record, Some(&human))
}

pub fn run_rebuild(data_dir: Option<PathBuf>, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::open(data_dir);
    let report: TaskRebuildReport = ctx.tasks().rebuild()?;

    let mut human = HumanOutput::new("Task snapshot rebuilt");
    human.push_summary("events", report.total_events.to_string());
    human.push_summary("tasks", report.total_tasks.to_string());

    emit_success(output, "rebuild", &report, Some(&human))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid date '{}': expected YYYY-MM-DD", raw.trim()))
    })
}

/// `"09:00-10:30 Write report"` carries its own times; anything else is all
/// text and gets the configured defaults. A range with no text is rejected.
fn parse_task_arg(raw: &str, config: &TasksConfig) -> Result<TaskDraft> {
    let raw = raw.trim();
    let (head, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
    if let Some((start, end)) = parse_range(head) {
        if rest.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "task '{raw}' has a time range but no text"
            )));
        }
        return Ok(TaskDraft::new(rest.trim(), start, end));
    }
    Ok(TaskDraft::new(
        raw,
        config.default_start.as_str(),
        config.default_end.as_str(),
    ))
}

fn parse_range(value: &str) -> Option<(&str, &str)> {
    let (start, end) = value.split_once('-')?;
    (looks_like_time(start) && looks_like_time(end)).then_some((start, end))
}

fn looks_like_time(value: &str) -> bool {
    value.contains(':') && value.chars().all(|c| c.is_ascii_digit() || c == ':')
}

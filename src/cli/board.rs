//! daycard board commands: cards and stats.

use std::path::PathBuf;

use serde::Serialize;

use crate::board::{format_card_date, format_clock_12h, DayCard, Dashboard};
use crate::cli::AppContext;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::TaskRecord;

pub struct CardsOptions {
    pub search: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct CardsReport {
    cards: Vec<DayCard>,
    points: usize,
    streak: u32,
    completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

#[derive(Serialize)]
struct StatsReport {
    points: usize,
    streak: u32,
    completed: usize,
    days: usize,
}

pub fn run_cards(options: CardsOptions) -> Result<()> {
    let ctx = AppContext::open(options.data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let mut dashboard = Dashboard::new(user);
    if let Some(query) = options.search.as_deref() {
        dashboard.set_search(query);
    }
    dashboard.refresh(&store)?;
    let cards = dashboard.visible_cards();
    let board = dashboard.board();

    let mut human = HumanOutput::new(format!("{}'s day cards", dashboard.user().name));
    human.push_summary("points", board.points.to_string());
    human.push_summary("streak", format_streak(board.streak));
    for card in &cards {
        human.push_detail(render_card(card));
    }
    if cards.is_empty() {
        match options.search.as_deref() {
            Some(query) if !query.trim().is_empty() => {
                human.push_warning(format!("no days match '{}'", query.trim()));
            }
            _ => human.push_next_step("daycard add \"09:00-10:00 Plan the day\""),
        }
    }

    let report = CardsReport {
        points: board.points,
        streak: board.streak,
        completed: board.completed,
        search: options.search.clone(),
        cards,
    };
    emit_success(options.output, "cards", &report, Some(&human))
}

pub fn run_stats(data_dir: Option<PathBuf>, output: OutputOptions) -> Result<()> {
    let ctx = AppContext::open(data_dir);
    let user = ctx.user()?;
    let store = ctx.tasks();

    let mut dashboard = Dashboard::new(user);
    let board = dashboard.refresh(&store)?;

    let report = StatsReport {
        points: board.points,
        streak: board.streak,
        completed: board.completed,
        days: board.cards.len(),
    };

    let mut human = HumanOutput::new("daycard stats");
    human.push_summary("points", report.points.to_string());
    human.push_summary("streak", format_streak(report.streak));
    human.push_summary("completed", format!("{}/{}", report.completed, report.points));
    human.push_summary("days", report.days.to_string());

    emit_success(output, "stats", &report, Some(&human))
}

/// `[x] 9:00 AM - 10:00 AM  Plan week  (01j0...)`
pub(crate) fn format_task_line(task: &TaskRecord) -> String {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    format!(
        "{marker} {} - {}  {}  ({})",
        format_clock_12h(&task.start_time),
        format_clock_12h(&task.end_time),
        task.text,
        task.id
    )
}

fn render_card(card: &DayCard) -> String {
    let mut lines = vec![format!(
        "{}  {}/{}",
        format_card_date(card.date),
        card.completed_count(),
        card.len()
    )];
    for task in &card.tasks {
        lines.push(format!("  {}", format_task_line(task)));
    }
    lines.join("\n")
}

fn format_streak(days: u32) -> String {
    match days {
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    }
}

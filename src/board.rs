//! Day-card view model.
//!
//! Turns a user's flat task list into day cards (most recent day first,
//! tasks by start time) and derives the streak and points shown beside them.
//! Everything here is rebuilt from scratch on every load.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::auth::UserProfile;
use crate::error::Result;
use crate::task::{is_clock_time, TaskRecord, TaskStore};

/// All of one user's tasks that fall on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCard {
    pub date: NaiveDate,
    pub tasks: Vec<TaskRecord>,
}

impl DayCard {
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Group records by date into cards ordered newest first; tasks inside a card
/// are ordered by `start_time` as plain strings.
pub fn build_day_cards(records: &[TaskRecord]) -> Vec<DayCard> {
    let mut grouped: BTreeMap<NaiveDate, Vec<TaskRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.date).or_default().push(record.clone());
    }

    grouped
        .into_iter()
        .rev()
        .map(|(date, mut tasks)| {
            tasks.sort_by(|a, b| a.start_time.cmp(&b.start_time));
            DayCard { date, tasks }
        })
        .collect()
}

/// Consecutive days ending at the newest card. `cards` must be sorted newest
/// first, as [`build_day_cards`] returns them.
pub fn compute_streak(cards: &[DayCard]) -> u32 {
    if cards.is_empty() {
        return 0;
    }

    let mut streak = 1;
    for pair in cards.windows(2) {
        let gap = (pair[0].date - pair[1].date).num_days();
        if gap != 1 {
            break;
        }
        streak += 1;
    }
    streak
}

/// Every record counts, completed or not.
pub fn compute_points(records: &[TaskRecord]) -> usize {
    records.len()
}

/// Cards whose `YYYY-MM-DD` date contains `query`; a blank query keeps all.
pub fn filter_cards(cards: &[DayCard], query: &str) -> Vec<DayCard> {
    let query = query.trim();
    if query.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|card| card.date.format("%Y-%m-%d").to_string().contains(query))
        .cloned()
        .collect()
}

/// `"14:05"` -> `"2:05 PM"`. Anything that is not a zero-padded 24-hour
/// `HH:MM` is returned unchanged.
pub fn format_clock_12h(time: &str) -> String {
    if !is_clock_time(time) {
        return time.to_string();
    }
    match NaiveTime::parse_from_str(time, "%H:%M") {
        Ok(clock) => clock.format("%-I:%M %p").to_string(),
        Err(_) => time.to_string(),
    }
}

/// `2024-01-01` -> `"Mon, Jan 1, 2024"`.
pub fn format_card_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d, %Y").to_string()
}

/// Cards plus the metrics derived from the same records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    pub cards: Vec<DayCard>,
    pub points: usize,
    pub streak: u32,
    pub completed: usize,
}

impl Board {
    pub fn from_records(records: &[TaskRecord]) -> Self {
        let cards = build_day_cards(records);
        let streak = compute_streak(&cards);
        Self {
            points: compute_points(records),
            completed: records.iter().filter(|task| task.completed).count(),
            streak,
            cards,
        }
    }
}

/// Identifies one load; only the most recently issued token may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadToken(u64);

/// Per-session view state: who is signed in, the last board, and the date
/// search.
#[derive(Debug, Clone)]
pub struct Dashboard {
    user: UserProfile,
    issued: u64,
    board: Board,
    search: String,
}

impl Dashboard {
    pub fn new(user: UserProfile) -> Self {
        Self {
            user,
            issued: 0,
            board: Board::default(),
            search: String::new(),
        }
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn begin_load(&mut self) -> LoadToken {
        self.issued += 1;
        LoadToken(self.issued)
    }

    /// Publish a rebuilt board unless a newer load has started since
    /// `token` was issued. Returns whether the result was applied.
    pub fn finish_load(&mut self, token: LoadToken, records: &[TaskRecord]) -> bool {
        if token.0 != self.issued {
            tracing::warn!(token = token.0, latest = self.issued, "discarding stale load");
            return false;
        }
        self.board = Board::from_records(records);
        true
    }

    /// Fetch the user's records and rebuild the board.
    pub fn refresh(&mut self, store: &TaskStore) -> Result<&Board> {
        let token = self.begin_load();
        let records = store.list_for_user(&self.user.id)?;
        self.finish_load(token, &records);
        Ok(&self.board)
    }

    /// Cards after the date search is applied.
    pub fn visible_cards(&self) -> Vec<DayCard> {
        filter_cards(&self.board.cards, &self.search)
    }
}

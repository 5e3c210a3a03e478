//! Task store for daycard.
//!
//! Tasks are stored as append-only events in `tasks.jsonl` with a
//! materialized `tasks.snapshot.json` beside it. Every mutation holds the
//! log's lock while it appends and rewrites the snapshot.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::{TasksConfig, TimePolicy};
use crate::error::{Error, Result};
use crate::lock;
use crate::storage::Storage;

const TASKS_SCHEMA_VERSION: &str = "daycard.tasks.v1";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventType {
    TaskCreated,
    TaskToggled,
    TaskUpdated,
    TaskDeleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub event_id: String,
    pub task_id: String,
    #[serde(rename = "type")]
    pub event_type: TaskEventType,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl TaskEvent {
    pub fn new(
        event_type: TaskEventType,
        task_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            task_id: task_id.into(),
            event_type,
            timestamp: Utc::now(),
            user_id: user_id.into(),
            date: None,
            text: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// A dated, timed, completable text item owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub start_time: String,
    pub end_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One task of a batch insert, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
    pub start_time: String,
    pub end_time: String,
}

impl TaskDraft {
    pub fn new(
        text: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

/// Field edits for an existing task; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.start_time.is_none() && self.end_time.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRebuildReport {
    pub total_events: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    config: TasksConfig,
}

impl TaskStore {
    pub fn new(storage: Storage, config: TasksConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    /// All records owned by `user_id`, in no particular order.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        let snapshot = self.load_snapshot()?;
        let tasks: Vec<TaskRecord> = snapshot
            .tasks
            .into_iter()
            .filter(|task| task.user_id == user_id)
            .collect();
        tracing::debug!(user_id, count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    pub fn get(&self, user_id: &str, task_id: &str) -> Result<TaskRecord> {
        self.load_snapshot()?
            .tasks
            .into_iter()
            .find(|task| task.id == task_id && task.user_id == user_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    /// Insert a batch of tasks for one date.
    ///
    /// Drafts with blank text are dropped; at least one must remain.
    pub fn create_batch(
        &self,
        user_id: &str,
        date: NaiveDate,
        drafts: Vec<TaskDraft>,
    ) -> Result<Vec<TaskRecord>> {
        let user_id = require_user(user_id)?;

        let mut events = Vec::new();
        for draft in drafts {
            let text = draft.text.trim();
            if text.is_empty() {
                continue;
            }
            let start_time = self.normalize_time("start time", &draft.start_time)?;
            let end_time = self.normalize_time("end time", &draft.end_time)?;
            warn_if_inverted(&start_time, &end_time);

            let mut event = TaskEvent::new(TaskEventType::TaskCreated, new_task_id(), user_id);
            event.date = Some(date);
            event.text = Some(text.to_string());
            event.start_time = Some(start_time);
            event.end_time = Some(end_time);
            events.push(event);
        }

        if events.is_empty() {
            return Err(Error::Validation(
                "at least one task with text is required".to_string(),
            ));
        }

        let ids: Vec<String> = events.iter().map(|event| event.task_id.clone()).collect();
        let snapshot = self.commit(&events)?;
        tracing::info!(user_id, %date, count = ids.len(), "created tasks");

        Ok(ids
            .iter()
            .filter_map(|id| snapshot.tasks.iter().find(|task| &task.id == id).cloned())
            .collect())
    }

    /// Flip the completed flag.
    pub fn toggle(&self, user_id: &str, task_id: &str) -> Result<TaskRecord> {
        let user_id = require_user(user_id)?;
        let event = TaskEvent::new(TaskEventType::TaskToggled, task_id, user_id);
        let snapshot = self.commit(&[event])?;
        let record = find_task(&snapshot, task_id)?;
        tracing::info!(user_id, task_id, completed = record.completed, "toggled task");
        Ok(record)
    }

    /// Edit text and/or times of an existing task.
    pub fn update(&self, user_id: &str, task_id: &str, patch: TaskPatch) -> Result<TaskRecord> {
        let user_id = require_user(user_id)?;
        if patch.is_empty() {
            return Err(Error::Validation(
                "nothing to update: pass text, start or end".to_string(),
            ));
        }

        let mut event = TaskEvent::new(TaskEventType::TaskUpdated, task_id, user_id);
        if let Some(text) = patch.text.as_deref() {
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::Validation("task text cannot be empty".to_string()));
            }
            event.text = Some(text.to_string());
        }
        if let Some(start) = patch.start_time.as_deref() {
            event.start_time = Some(self.normalize_time("start time", start)?);
        }
        if let Some(end) = patch.end_time.as_deref() {
            event.end_time = Some(self.normalize_time("end time", end)?);
        }

        let snapshot = self.commit(&[event])?;
        let record = find_task(&snapshot, task_id)?;
        warn_if_inverted(&record.start_time, &record.end_time);
        tracing::info!(user_id, task_id, "updated task");
        Ok(record)
    }

    /// Remove a task, returning the record as it was.
    pub fn delete(&self, user_id: &str, task_id: &str) -> Result<TaskRecord> {
        let user_id = require_user(user_id)?;
        let existing = self.get(user_id, task_id)?;
        let event = TaskEvent::new(TaskEventType::TaskDeleted, task_id, user_id);
        self.commit(&[event])?;
        tracing::info!(user_id, task_id, "deleted task");
        Ok(existing)
    }

    /// Resolve a full id or a unique, case-insensitive prefix of one of the
    /// user's task ids.
    pub fn resolve_id(&self, user_id: &str, input: &str) -> Result<String> {
        let needle = input.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }

        let tasks = self.list_for_user(user_id)?;
        if let Some(task) = tasks.iter().find(|task| task.id == needle) {
            return Ok(task.id.clone());
        }

        let mut matches: Vec<String> = tasks
            .into_iter()
            .filter(|task| task.id.starts_with(&needle))
            .map(|task| task.id)
            .collect();
        matches.sort();

        match matches.len() {
            0 => Err(Error::TaskNotFound(input.trim().to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::InvalidArgument(format!(
                "ambiguous task id '{}': {}",
                input.trim(),
                matches.join(", ")
            ))),
        }
    }

    /// Regenerate the snapshot from the event log.
    pub fn rebuild(&self) -> Result<TaskRebuildReport> {
        let log_path = self.storage.tasks_log();
        lock::with_lock(&log_path, || {
            let events: Vec<TaskEvent> = self.storage.read_jsonl(&log_path)?;
            let snapshot = build_snapshot(&events)?;
            self.storage
                .write_json(&self.storage.tasks_snapshot(), &snapshot)?;
            Ok(TaskRebuildReport {
                total_events: events.len(),
                total_tasks: snapshot.tasks.len(),
            })
        })
    }

    fn normalize_time(&self, label: &str, value: &str) -> Result<String> {
        normalize_time(label, value, self.config.time_policy)
    }

    fn load_snapshot(&self) -> Result<TaskSnapshot> {
        let snapshot_path = self.storage.tasks_snapshot();
        if let Some(snapshot) = self.storage.read_json_opt(&snapshot_path)? {
            return Ok(snapshot);
        }
        let events: Vec<TaskEvent> = self.storage.read_jsonl(&self.storage.tasks_log())?;
        build_snapshot(&events)
    }

    /// Apply events to the current snapshot, then persist log and snapshot.
    ///
    /// Events are validated against the snapshot before anything is written,
    /// so a rejected mutation leaves both files untouched.
    fn commit(&self, events: &[TaskEvent]) -> Result<TaskSnapshot> {
        self.storage.ensure_dir()?;
        let log_path = self.storage.tasks_log();
        lock::with_lock(&log_path, || {
            let mut snapshot = self.load_snapshot()?;
            let mut map: HashMap<String, TaskRecord> = snapshot
                .tasks
                .drain(..)
                .map(|task| (task.id.clone(), task))
                .collect();
            for event in events {
                apply_event(&mut map, event)?;
            }

            for event in events {
                self.storage.append_jsonl(&log_path, event)?;
            }
            snapshot.tasks = sorted_tasks(map);
            snapshot.generated_at = Utc::now();
            self.storage
                .write_json(&self.storage.tasks_snapshot(), &snapshot)?;
            tracing::debug!(events = events.len(), tasks = snapshot.tasks.len(), "committed");
            Ok(snapshot)
        })
    }
}

/// True for a zero-padded 24-hour `HH:MM` string.
pub fn is_clock_time(value: &str) -> bool {
    value.len() == 5
        && value.as_bytes()[2] == b':'
        && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}

fn normalize_time(label: &str, value: &str, policy: TimePolicy) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{label} is required")));
    }
    if policy == TimePolicy::Strict && !is_clock_time(trimmed) {
        return Err(Error::Validation(format!(
            "invalid {label} '{trimmed}': expected HH:MM (24-hour)"
        )));
    }
    Ok(trimmed.to_string())
}

fn warn_if_inverted(start_time: &str, end_time: &str) {
    if is_clock_time(start_time) && is_clock_time(end_time) && end_time < start_time {
        tracing::warn!(start_time, end_time, "task ends before it starts");
    }
}

fn require_user(user_id: &str) -> Result<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("user id cannot be empty".to_string()));
    }
    Ok(trimmed)
}

fn new_task_id() -> String {
    Ulid::new().to_string().to_ascii_lowercase()
}

fn find_task(snapshot: &TaskSnapshot, task_id: &str) -> Result<TaskRecord> {
    snapshot
        .tasks
        .iter()
        .find(|task| task.id == task_id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
}

fn sorted_tasks(map: HashMap<String, TaskRecord>) -> Vec<TaskRecord> {
    let mut tasks: Vec<TaskRecord> = map.into_values().collect();
    tasks.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    tasks
}

fn build_snapshot(events: &[TaskEvent]) -> Result<TaskSnapshot> {
    let mut map = HashMap::new();
    for event in events {
        apply_event(&mut map, event)?;
    }
    Ok(TaskSnapshot {
        schema_version: TASKS_SCHEMA_VERSION.to_string(),
        generated_at: Utc::now(),
        tasks: sorted_tasks(map),
    })
}

fn owned_record<'a>(
    map: &'a mut HashMap<String, TaskRecord>,
    event: &TaskEvent,
) -> Result<&'a mut TaskRecord> {
    match map.get_mut(&event.task_id) {
        Some(record) if record.user_id == event.user_id => Ok(record),
        _ => Err(Error::TaskNotFound(event.task_id.clone())),
    }
}

fn apply_event(map: &mut HashMap<String, TaskRecord>, event: &TaskEvent) -> Result<()> {
    match event.event_type {
        TaskEventType::TaskCreated => {
            if map.contains_key(&event.task_id) {
                return Err(Error::OperationFailed(format!(
                    "task already exists: {}",
                    event.task_id
                )));
            }
            let missing = |field: &str| {
                Error::OperationFailed(format!("missing {field} for {}", event.task_id))
            };
            let date = event.date.ok_or_else(|| missing("date"))?;
            let text = event.text.clone().ok_or_else(|| missing("text"))?;
            let start_time = event.start_time.clone().ok_or_else(|| missing("start_time"))?;
            let end_time = event.end_time.clone().ok_or_else(|| missing("end_time"))?;

            map.insert(
                event.task_id.clone(),
                TaskRecord {
                    id: event.task_id.clone(),
                    user_id: event.user_id.clone(),
                    date,
                    text,
                    completed: false,
                    start_time,
                    end_time,
                    created_at: event.timestamp,
                    updated_at: event.timestamp,
                },
            );
        }
        TaskEventType::TaskToggled => {
            let record = owned_record(map, event)?;
            record.completed = !record.completed;
            record.updated_at = event.timestamp;
        }
        TaskEventType::TaskUpdated => {
            let record = owned_record(map, event)?;
            if let Some(text) = &event.text {
                record.text = text.clone();
            }
            if let Some(start_time) = &event.start_time {
                record.start_time = start_time.clone();
            }
            if let Some(end_time) = &event.end_time {
                record.end_time = end_time.clone();
            }
            record.updated_at = event.timestamp;
        }
        TaskEventType::TaskDeleted => {
            owned_record(map, event)?;
            map.remove(&event.task_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("date")
    }

    fn store_in(dir: &std::path::Path) -> TaskStore {
        TaskStore::new(Storage::new(dir.to_path_buf()), TasksConfig::default())
    }

    #[test]
    fn clock_time_requires_zero_padded_24h() {
        assert!(is_clock_time("00:00"));
        assert!(is_clock_time("09:05"));
        assert!(is_clock_time("23:59"));
        assert!(!is_clock_time("9:05"));
        assert!(!is_clock_time("24:00"));
        assert!(!is_clock_time("12:60"));
        assert!(!is_clock_time("12-30"));
        assert!(!is_clock_time(""));
    }

    #[test]
    fn create_batch_drops_blank_drafts() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let created = store
            .create_batch(
                "user-1",
                date("2024-01-02"),
                vec![
                    TaskDraft::new("  Write report ", "09:00", "10:00"),
                    TaskDraft::new("   ", "10:00", "11:00"),
                    TaskDraft::new("Gym", "18:00", "19:00"),
                ],
            )
            .expect("create");

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].text, "Write report");
        assert!(!created[0].completed);
        assert_eq!(store.list_for_user("user-1").expect("list").len(), 2);
        assert!(store.list_for_user("user-2").expect("list").is_empty());
    }

    #[test]
    fn create_batch_with_only_blank_text_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let err = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("", "09:00", "10:00")])
            .expect_err("no tasks");
        assert!(matches!(err, Error::Validation(_)));
        assert!(!store.storage.tasks_log().exists());
    }

    #[test]
    fn strict_policy_rejects_malformed_time() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let err = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("Run", "9am", "10:00")])
            .expect_err("bad time");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn lenient_policy_keeps_time_as_given_and_inverted_ranges_pass() {
        let dir = tempdir().expect("tempdir");
        let mut config = TasksConfig::default();
        config.time_policy = TimePolicy::Lenient;
        let store = TaskStore::new(Storage::new(dir.path().to_path_buf()), config);

        let created = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("Nap", "9:00", "8:00")])
            .expect("create");
        assert_eq!(created[0].start_time, "9:00");

        let strict = store_in(dir.path());
        let inverted = strict
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("Shift", "22:00", "06:00")])
            .expect("inverted range accepted");
        assert_eq!(inverted[0].end_time, "06:00");
    }

    #[test]
    fn toggle_flips_and_persists() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("Read", "20:00", "21:00")])
            .expect("create");
        let id = created[0].id.clone();

        assert!(store.toggle("user-1", &id).expect("toggle").completed);
        assert!(store.get("user-1", &id).expect("get").completed);
        assert!(!store.toggle("user-1", &id).expect("toggle").completed);
    }

    #[test]
    fn update_applies_partial_patch() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("Read", "20:00", "21:00")])
            .expect("create");
        let id = created[0].id.clone();

        let updated = store
            .update(
                "user-1",
                &id,
                TaskPatch {
                    text: Some("Read a book".to_string()),
                    start_time: None,
                    end_time: Some("21:30".to_string()),
                },
            )
            .expect("update");
        assert_eq!(updated.text, "Read a book");
        assert_eq!(updated.start_time, "20:00");
        assert_eq!(updated.end_time, "21:30");
        assert!(updated.updated_at >= updated.created_at);

        let err = store
            .update("user-1", &id, TaskPatch::default())
            .expect_err("empty patch");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn mutations_on_missing_or_foreign_tasks_are_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create_batch("owner", date("2024-01-02"), vec![TaskDraft::new("Mine", "08:00", "09:00")])
            .expect("create");
        let id = created[0].id.clone();

        assert!(matches!(store.toggle("intruder", &id), Err(Error::TaskNotFound(_))));
        assert!(matches!(store.delete("intruder", &id), Err(Error::TaskNotFound(_))));
        assert!(matches!(store.toggle("owner", "missing"), Err(Error::TaskNotFound(_))));

        let events: Vec<TaskEvent> = store.storage.read_jsonl(&store.storage.tasks_log()).expect("log");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn delete_removes_record() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create_batch(
                "user-1",
                date("2024-01-02"),
                vec![
                    TaskDraft::new("A", "08:00", "09:00"),
                    TaskDraft::new("B", "09:00", "10:00"),
                ],
            )
            .expect("create");

        let removed = store.delete("user-1", &created[0].id).expect("delete");
        assert_eq!(removed.text, "A");
        let remaining = store.list_for_user("user-1").expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "B");
    }

    #[test]
    fn resolve_id_accepts_unique_prefix() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("A", "08:00", "09:00")])
            .expect("create");
        let id = created[0].id.clone();

        assert_eq!(store.resolve_id("user-1", &id).expect("exact"), id);
        assert_eq!(
            store.resolve_id("user-1", &id[..20].to_ascii_uppercase()).expect("prefix"),
            id
        );
        assert!(matches!(
            store.resolve_id("user-2", &id),
            Err(Error::TaskNotFound(_))
        ));
        assert!(matches!(
            store.resolve_id("user-1", " "),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolve_id_reports_ambiguity() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        store
            .create_batch(
                "user-1",
                date("2024-01-02"),
                vec![
                    TaskDraft::new("A", "08:00", "09:00"),
                    TaskDraft::new("B", "09:00", "10:00"),
                ],
            )
            .expect("create");

        // ULIDs minted today all start with '0'.
        let err = store.resolve_id("user-1", "0").expect_err("ambiguous");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rebuild_restores_missing_snapshot() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());
        let created = store
            .create_batch("user-1", date("2024-01-02"), vec![TaskDraft::new("A", "08:00", "09:00")])
            .expect("create");
        store.toggle("user-1", &created[0].id).expect("toggle");

        std::fs::remove_file(store.storage.tasks_snapshot()).expect("remove snapshot");
        let from_log = store.list_for_user("user-1").expect("list from log");
        assert!(from_log[0].completed);

        let report = store.rebuild().expect("rebuild");
        assert_eq!(report.total_events, 2);
        assert_eq!(report.total_tasks, 1);
        assert!(store.storage.tasks_snapshot().exists());
    }

    #[test]
    fn task_record_serializes_camel_case() {
        let now = Utc::now();
        let record = TaskRecord {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            date: date("2024-03-09"),
            text: "Stretch".to_string(),
            completed: false,
            start_time: "07:00".to_string(),
            end_time: "07:15".to_string(),
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["date"], "2024-03-09");
        assert_eq!(value["startTime"], "07:00");
        assert_eq!(value["endTime"], "07:15");
    }
}

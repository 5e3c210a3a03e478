use chrono::{NaiveDate, TimeZone, Utc};

use daycard::board::{build_day_cards, compute_points, compute_streak, Board};
use daycard::task::TaskRecord;

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

fn record(id: &str, day: &str, start: &str, completed: bool) -> TaskRecord {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    TaskRecord {
        id: id.to_string(),
        user_id: "u1".to_string(),
        date: date(day),
        text: format!("task {id}"),
        completed,
        start_time: start.to_string(),
        end_time: start.to_string(),
        created_at: created,
        updated_at: created,
    }
}

#[test]
fn empty_input_yields_nothing() {
    assert!(build_day_cards(&[]).is_empty());
    assert_eq!(compute_streak(&[]), 0);
    assert_eq!(compute_points(&[]), 0);
}

#[test]
fn every_record_lands_in_exactly_one_matching_card() {
    let records = vec![
        record("a", "2024-01-01", "09:00", false),
        record("b", "2024-01-02", "09:00", true),
        record("c", "2024-01-01", "10:00", true),
        record("d", "2024-01-05", "08:00", false),
    ];
    let cards = build_day_cards(&records);

    let total: usize = cards.iter().map(|card| card.tasks.len()).sum();
    assert_eq!(total, records.len());
    for card in &cards {
        assert!(!card.tasks.is_empty());
        assert!(card.tasks.iter().all(|task| task.date == card.date));
    }
    for record in &records {
        let holders = cards
            .iter()
            .filter(|card| card.tasks.iter().any(|task| task.id == record.id))
            .count();
        assert_eq!(holders, 1, "record {} placed once", record.id);
    }

    let mut dates: Vec<NaiveDate> = cards.iter().map(|card| card.date).collect();
    dates.dedup();
    assert_eq!(dates.len(), cards.len());
}

#[test]
fn tasks_within_a_day_sort_by_start_time() {
    let cards = build_day_cards(&[
        record("a", "2024-01-01", "14:00", false),
        record("b", "2024-01-01", "09:00", false),
        record("c", "2024-01-01", "11:30", false),
    ]);
    let starts: Vec<&str> = cards[0]
        .tasks
        .iter()
        .map(|task| task.start_time.as_str())
        .collect();
    assert_eq!(starts, ["09:00", "11:30", "14:00"]);
}

#[test]
fn equal_start_times_keep_input_order() {
    let cards = build_day_cards(&[
        record("first", "2024-01-01", "09:00", false),
        record("second", "2024-01-01", "09:00", false),
    ]);
    assert_eq!(cards[0].tasks[0].id, "first");
    assert_eq!(cards[0].tasks[1].id, "second");
}

#[test]
fn cards_sort_newest_first() {
    let cards = build_day_cards(&[
        record("a", "2024-01-01", "09:00", false),
        record("b", "2024-01-03", "09:00", false),
        record("c", "2024-01-02", "09:00", false),
    ]);
    let dates: Vec<NaiveDate> = cards.iter().map(|card| card.date).collect();
    assert_eq!(
        dates,
        [date("2024-01-03"), date("2024-01-02"), date("2024-01-01")]
    );
}

#[test]
fn streak_counts_consecutive_days_from_latest() {
    let cards = build_day_cards(&[
        record("a", "2024-01-05", "09:00", false),
        record("b", "2024-01-04", "09:00", false),
        record("c", "2024-01-03", "09:00", false),
        record("d", "2024-01-01", "09:00", false),
    ]);
    assert_eq!(compute_streak(&cards), 3);
}

#[test]
fn single_card_is_a_streak_of_one() {
    let cards = build_day_cards(&[
        record("a", "2024-06-10", "09:00", false),
        record("b", "2024-06-10", "12:00", true),
    ]);
    assert_eq!(compute_streak(&cards), 1);
}

#[test]
fn streak_ignores_today() {
    // Only gaps between cards matter; the current date plays no part.
    let cards = build_day_cards(&[
        record("a", "2001-03-02", "09:00", false),
        record("b", "2001-03-01", "09:00", false),
    ]);
    assert_eq!(compute_streak(&cards), 2);
}

#[test]
fn points_count_every_record() {
    let records: Vec<TaskRecord> = (0..7)
        .map(|i| {
            let day = format!("2024-01-{:02}", 1 + i % 3);
            record(&format!("t{i}"), &day, "09:00", i % 2 == 0)
        })
        .collect();
    assert_eq!(compute_points(&records), 7);
}

#[test]
fn building_twice_gives_the_same_board() {
    let records = vec![
        record("a", "2024-01-02", "14:00", false),
        record("b", "2024-01-01", "09:00", true),
        record("c", "2024-01-02", "08:00", true),
    ];
    assert_eq!(build_day_cards(&records), build_day_cards(&records));
    assert_eq!(Board::from_records(&records), Board::from_records(&records));
}

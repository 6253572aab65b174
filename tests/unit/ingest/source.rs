use chrono::NaiveDate;

use super::*;
use crate::grid::event::EventKind;

const EXPORT: &str = "\
Type,Start,End,Duration,Start Condition,Start Location,End Condition,Notes
sleep,2024-01-01 20:00,2024-01-02 06:30,,,,,
feed,2024-01-01 22:15,,,,,,
meds,2024-01-02 09:00,,,,\"Tylenol 2.5ml\",,
meds,2024-01-02 09:05,,,,Ibuprofen,,
meds,2024-01-02 09:10,,,,Mystery Syrup,,
diaper,2024-01-02 10:00,,,,,,
sleep,2024-01-02 13:00,,,,,,
feed,not a date,,,,,,
";

fn load(csv: &str) -> LoadedEvents {
    read_events(csv.as_bytes(), &SourceConfig::default(), &ChannelSet::default()).unwrap()
}

#[test]
fn tracked_rows_become_events() {
    let loaded = load(EXPORT);
    let r = &loaded.report;
    assert_eq!(r.rows, 8);
    assert_eq!((r.sleeps, r.feeds, r.meds), (1, 1, 3));
    assert_eq!(r.events(), loaded.events.len());

    let first = &loaded.events[0];
    assert_eq!(first.kind, EventKind::Sleep);
    assert_eq!(
        first.end,
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(6, 30, 0)
    );
}

#[test]
fn medication_labels_are_normalized() {
    let loaded = load(EXPORT);
    let names: Vec<&str> = loaded
        .events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Med(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["Tylenol", "Motrin", "Other"]);
    assert_eq!(loaded.report.medications.get("Other"), Some(&1));
}

#[test]
fn untracked_kinds_are_ignored_and_bad_rows_dropped() {
    let r = load(EXPORT).report;
    assert_eq!(r.ignored, 1);
    // Sleep without an end and a feed with an unparseable start.
    assert_eq!(r.dropped, 2);
}

#[test]
fn missing_kind_or_start_column_is_fatal() {
    let err = read_events(
        "Kind,Start\nsleep,2024-01-01 10:00\n".as_bytes(),
        &SourceConfig::default(),
        &ChannelSet::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SleepGridError::Input(_)));
    assert!(err.to_string().contains("'Type'"));

    assert!(
        read_events(
            "Type,When\nfeed,2024-01-01 10:00\n".as_bytes(),
            &SourceConfig::default(),
            &ChannelSet::default(),
        )
        .is_err()
    );
}

#[test]
fn missing_optional_columns_only_affect_rows_that_need_them() {
    let loaded = load("Type,Start\nfeed,2024-01-01 10:00\nsleep,2024-01-01 11:00\nmeds,2024-01-01 12:00\n");
    assert_eq!(loaded.report.feeds, 1);
    assert_eq!(loaded.report.dropped, 1);
    assert_eq!(loaded.events.last().map(|e| e.kind.clone()), Some(EventKind::Med("Other".into())));
}

#[test]
fn column_and_kind_names_are_configurable() {
    let cfg = SourceConfig {
        type_column: "Activity".into(),
        start_column: "From".into(),
        end_column: "To".into(),
        med_name_column: "Detail".into(),
        sleep_type: "Nap".into(),
        feed_type: "Bottle".into(),
        meds_type: "Medicine".into(),
    };
    let csv = "Activity,From,To,Detail\nNap,2024-01-01 13:00,2024-01-01 14:00,\nBottle,2024-01-01 15:00,,\nMedicine,2024-01-01 16:00,,Pepcid\nsleep,2024-01-01 17:00,2024-01-01 18:00,\n";
    let loaded = read_events(csv.as_bytes(), &cfg, &ChannelSet::default()).unwrap();
    assert_eq!(loaded.events.len(), 3);
    assert_eq!(loaded.report.ignored, 1);
    assert_eq!(loaded.events[2].kind, EventKind::Med("Pepcid".into()));
}

#[test]
fn short_rows_are_tolerated() {
    let loaded = load("Type,Start,End\nfeed,2024-01-01 10:00\n");
    assert_eq!(loaded.report.feeds, 1);
}

#[test]
fn loading_a_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_events(
        &dir.path().join("nope.csv"),
        &SourceConfig::default(),
        &ChannelSet::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("nope.csv"));
}

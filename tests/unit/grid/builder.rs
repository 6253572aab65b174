use chrono::NaiveDate;

use super::*;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn builder() -> BucketGridBuilder {
    BucketGridBuilder::new(GridParams::default(), ChannelSet::default())
}

#[test]
fn span_uses_earliest_start_and_latest_sleep_end() {
    let events = [
        Event::feed(at(2024, 1, 3, 12, 0)),
        Event::sleep(at(2024, 1, 1, 6, 30), at(2024, 1, 1, 8, 0)),
        Event::sleep(at(2024, 1, 4, 22, 0), at(2024, 1, 5, 8, 0)),
    ];
    let span = DateSpan::from_events(&events, GridParams::default()).unwrap();
    // 06:30 belongs to the day that started on Dec 31 at 07:00.
    assert_eq!(span.day_zero, at(2023, 12, 31, 7, 0));
    assert_eq!(span.total_days, 6);
}

#[test]
fn empty_event_set_is_an_input_error() {
    let err = builder().build(&[]).unwrap_err();
    assert!(matches!(err, SleepGridError::Input(_)));
    assert!(err.to_string().contains("no valid events"));
}

#[test]
fn grid_is_fully_dense() {
    let events = [
        Event::feed(at(2024, 1, 1, 9, 0)),
        Event::feed(at(2024, 1, 3, 9, 0)),
    ];
    let out = builder().build(&events).unwrap();
    assert_eq!(out.grid.total_days(), 3);
    assert_eq!(out.grid.rows_per_day(), 288);
    assert_eq!(out.grid.cell_count(), 3 * 288 * 10);
    assert_eq!(out.grid.rows().count(), 3 * 288);
    assert_eq!(out.day_zero, at(2024, 1, 1, 7, 0));
}

#[test]
fn rows_are_ordered_by_day_then_minute() {
    let out = builder()
        .build(&[Event::feed(at(2024, 1, 2, 7, 5))])
        .unwrap();
    let keys: Vec<BucketKey> = out.grid.rows().map(|(k, _)| k).take(3).collect();
    assert_eq!(
        keys,
        [BucketKey::new(0, 0), BucketKey::new(0, 5), BucketKey::new(0, 10)]
    );
    let (key, bits) = out.grid.rows().nth(1).unwrap();
    assert_eq!(key, BucketKey::new(0, 5));
    assert_eq!(bits.len(), 10);
    assert!(bits[1]);
    assert!(!bits[0]);
}

#[test]
fn overlapping_events_union() {
    let events = [
        Event::sleep(at(2024, 1, 1, 13, 0), at(2024, 1, 1, 14, 0)),
        Event::sleep(at(2024, 1, 1, 13, 30), at(2024, 1, 1, 14, 30)),
    ];
    let out = builder().build(&events).unwrap();
    assert_eq!(out.grid.occupied(0, None), 18);
    assert!(out.grid.is_set(&Channel::Asleep, BucketKey::new(0, 420)));
    assert!(!out.grid.is_set(&Channel::Asleep, BucketKey::new(0, 450)));
}

#[test]
fn out_of_range_reads_and_writes_are_harmless() {
    let mut grid = BucketGrid::empty(5, 1, ChannelSet::default()).unwrap();
    assert!(!grid.set(0, BucketKey::new(1, 0)));
    assert!(!grid.set(0, BucketKey::new(0, 3)));
    assert!(!grid.set(99, BucketKey::new(0, 0)));
    assert!(!grid.get(0, 5, 0));
    assert!(grid.set(0, BucketKey::new(0, 1435)));
    assert!(grid.get(0, 0, 287));
}

#[test]
fn invalid_bucket_width_is_rejected() {
    assert!(BucketGrid::empty(7, 1, ChannelSet::default()).is_err());
    assert!(BucketGrid::empty(0, 1, ChannelSet::default()).is_err());
}

#[test]
fn occupied_can_be_limited_to_leading_days() {
    let events = [
        Event::feed(at(2024, 1, 1, 9, 0)),
        Event::feed(at(2024, 1, 2, 9, 0)),
        Event::feed(at(2024, 1, 3, 9, 0)),
    ];
    let out = builder().build(&events).unwrap();
    assert_eq!(out.grid.occupied(1, None), 3);
    assert_eq!(out.grid.occupied(1, Some(2)), 2);
    assert_eq!(out.grid.occupied(1, Some(100)), 3);
}

#[test]
fn summary_reports_sleep_and_feed_rates() {
    let events = [
        Event::sleep(at(2024, 1, 1, 8, 0), at(2024, 1, 1, 10, 0)),
        Event::feed(at(2024, 1, 1, 12, 0)),
        Event::feed(at(2024, 1, 2, 12, 0)),
    ];
    let summary = builder().build(&events).unwrap().grid.summary();
    assert_eq!(summary.total_days, 2);
    assert_eq!(summary.total_buckets, 576);
    assert_eq!(summary.asleep_buckets, 24);
    assert_eq!(summary.feed_buckets, 2);
    assert!((summary.sleep_minutes_per_day() - 60.0).abs() < 1e-9);
    assert!((summary.feeds_per_day() - 1.0).abs() < 1e-9);
    assert!((summary.asleep_percent() - 100.0 * 24.0 / 576.0).abs() < 1e-9);
}

#[test]
fn stats_are_carried_through_the_build() {
    let t = at(2024, 1, 1, 9, 0);
    let out = builder()
        .build(&[Event::sleep(t, t), Event::feed(t)])
        .unwrap();
    assert_eq!(out.stats.degenerate_intervals, 1);
    assert_eq!(out.grid.occupied(0, None), 0);
}

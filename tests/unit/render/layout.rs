use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn layout(total_days: u32, day_zero: NaiveDate, birthday: u32, max_months: u32) -> HeatmapLayout {
    HeatmapLayout::compute(
        total_days,
        day_zero,
        MonthPolicy::new(birthday, max_months).unwrap(),
        GridParams::default(),
        LayoutParams::default(),
    )
    .unwrap()
}

#[test]
fn boundaries_fall_on_the_birthday_and_skip_day_zero() {
    assert_eq!(month_boundaries(date(2024, 1, 15), 70, 15), [31, 60]);
    // Leap February: Mar 1 is day 60.
    assert_eq!(month_boundaries(date(2024, 1, 1), 70, 1), [31, 60]);
}

#[test]
fn short_months_have_no_boundary() {
    // Jan 31 and Mar 31 exist; February has no 31st.
    assert_eq!(month_boundaries(date(2024, 1, 1), 100, 31), [30, 90]);
}

#[test]
fn truncation_keeps_whole_months() {
    let l = layout(100, date(2024, 1, 1), 1, 2);
    assert_eq!(l.boundaries(), [31, 60]);
    // Apr 1 (day 91) would be the third boundary; display stops right before it.
    assert_eq!(l.displayed_days(), 91);
}

#[test]
fn no_truncation_when_boundaries_fit() {
    let l = layout(100, date(2024, 1, 1), 1, 3);
    assert_eq!(l.boundaries(), [31, 60, 91]);
    assert_eq!(l.displayed_days(), 100);
}

#[test]
fn column_offsets_add_one_separator_per_boundary() {
    let l = layout(100, date(2024, 1, 1), 1, 2);
    assert_eq!(l.col_offset(0), 0);
    assert_eq!(l.col_offset(30), 240);
    assert_eq!(l.col_offset(31), 31 * 8 + 8);
    assert_eq!(l.col_offset(60), 60 * 8 + 16);
    assert_eq!(l.total_cols(), 91 * 6 + 90 * 2 + 2 * 8);
    assert_eq!(l.day_columns(90).end, l.total_cols());
}

#[test]
fn column_offsets_strictly_increase() {
    let l = layout(400, date(2024, 1, 10), 10, 24);
    let offsets: Vec<u32> = (0..l.displayed_days()).map(|d| l.col_offset(d)).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    for w in offsets.windows(2) {
        let gap = w[1] - w[0];
        assert!(gap == 8 || gap == 16, "gap {gap}");
    }
}

#[test]
fn separator_line_sits_inside_the_widened_gap() {
    let l = layout(100, date(2024, 1, 1), 1, 2);
    assert_eq!(l.separator_col(31), 256 - 5);
    let seps: Vec<_> = l.separators().collect();
    assert_eq!(seps[0], (31, 251..253));
    let prev_day_end = l.day_columns(30).end;
    assert!(seps[0].1.start >= prev_day_end);
    assert!(seps[0].1.end <= l.col_offset(31));
    assert_eq!(l.separator_rows(), 72..216);
}

#[test]
fn reference_rows_follow_the_day_start_hour() {
    let bands = RowBands::for_params(GridParams::default());
    assert_eq!((bands.work_start, bands.work_end, bands.midnight), (24, 120, 204));
    assert_eq!(bands.midnight_rows(288), 203..206);

    let midnight_start = RowBands::for_params(GridParams::new(0, 15).unwrap());
    assert_eq!(midnight_start.midnight, 0);
    assert_eq!(midnight_start.midnight_rows(96), 0..2);
    assert_eq!(midnight_start.work_rows(), 36..68);
}

#[test]
fn work_band_that_would_wrap_is_empty() {
    let bands = RowBands::for_params(GridParams::new(10, 5).unwrap());
    assert_eq!(bands.work_start, 276);
    assert_eq!(bands.work_end, 84);
    assert!(bands.work_rows().is_empty());
}

#[test]
fn invalid_policies_are_rejected() {
    assert!(MonthPolicy::new(0, 24).is_err());
    assert!(MonthPolicy::new(32, 24).is_err());
    assert!(MonthPolicy::new(1, 0).is_err());
}

#[test]
fn a_single_day_has_no_padding() {
    let l = layout(1, date(2024, 1, 1), 1, 24);
    assert_eq!(l.total_cols(), 6);
    assert_eq!(l.rows(), 288);
}

use chrono::NaiveDate;

use super::*;
use crate::{
    grid::index::GridParams,
    render::layout::{LayoutParams, MonthPolicy},
};

#[test]
fn age_labels() {
    assert_eq!(age_label(0), "Born");
    assert_eq!(age_label(1), "1 mo");
    assert_eq!(age_label(11), "11 mo");
    assert_eq!(age_label(12), "1 yr");
    assert_eq!(age_label(14), "1 yr 2 mo");
    assert_eq!(age_label(24), "2 yr");
}

#[test]
fn hour_labels_use_twelve_hour_clock() {
    assert_eq!(hour_label(0), "12 am");
    assert_eq!(hour_label(7), "7 am");
    assert_eq!(hour_label(12), "12 pm");
    assert_eq!(hour_label(13), "1 pm");
    assert_eq!(hour_label(23), "11 pm");
    assert_eq!(hour_label(24), "12 am");
}

#[test]
fn section_labels_start_with_born_then_follow_separators() {
    let layout = HeatmapLayout::compute(
        100,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        MonthPolicy::new(1, 24).unwrap(),
        GridParams::default(),
        LayoutParams::default(),
    )
    .unwrap();
    let labels = section_labels(&layout);
    let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["Born", "1 mo", "2 mo", "3 mo"]);
    assert_eq!(labels[0].column, 0);
    assert_eq!(labels[1].column, layout.separator_col(31));
}

#[test]
fn labels_serialize_as_column_and_text() {
    let v = serde_json::to_value(SectionLabel {
        column: 3,
        text: "Born".into(),
    })
    .unwrap();
    assert_eq!(v, serde_json::json!({"column": 3, "text": "Born"}));
}

//! Text attached to the heatmap: section (age) labels and hour captions.

use serde::{Deserialize, Serialize};

use crate::render::layout::HeatmapLayout;

/// A label anchored at a heatmap column, for an external text renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLabel {
    /// Left edge of the label, in heatmap columns.
    pub column: u32,
    /// Label text.
    pub text: String,
}

/// Age after `months` completed months: `Born`, `N mo`, `Y yr` or `Y yr M mo`.
pub fn age_label(months: u32) -> String {
    let (years, rem) = (months / 12, months % 12);
    match (years, rem) {
        (0, 0) => "Born".to_owned(),
        (0, m) => format!("{m} mo"),
        (y, 0) => format!("{y} yr"),
        (y, m) => format!("{y} yr {m} mo"),
    }
}

/// 12-hour caption for an hour of day: `12 am`, `7 am`, `12 pm`, `5 pm`.
pub fn hour_label(hour: u32) -> String {
    let hour = hour % 24;
    let suffix = if hour < 12 { "am" } else { "pm" };
    let h12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{h12} {suffix}")
}

/// `Born` at the first day, then one label per month boundary at its separator column.
pub fn section_labels(layout: &HeatmapLayout) -> Vec<SectionLabel> {
    let mut labels = Vec::with_capacity(layout.boundaries().len() + 1);
    labels.push(SectionLabel {
        column: layout.col_offset(0),
        text: age_label(0),
    });
    for (i, &boundary) in layout.boundaries().iter().enumerate() {
        labels.push(SectionLabel {
            column: layout.separator_col(boundary),
            text: age_label(i as u32 + 1),
        });
    }
    labels
}

#[cfg(test)]
#[path = "../../tests/unit/render/labels.rs"]
mod tests;

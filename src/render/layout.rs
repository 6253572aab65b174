//! Pure heatmap geometry: which pixel columns each day occupies, where month separators go and
//! which rows carry the time-of-day reference bands.
//!
//! Columns are placed additively. Each month boundary at or before a day shifts that day right by
//! `separator_width - day_padding`, so inserting a separator never re-flows earlier days.

use std::ops::Range;

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::{
    foundation::error::{SleepGridError, SleepGridResult},
    grid::index::GridParams,
};

/// Column geometry constants, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutParams {
    /// Width of one day lane.
    pub day_width: u32,
    /// Gap between adjacent days.
    pub day_padding: u32,
    /// Gap on each side of a separator line.
    pub separator_padding: u32,
    /// Width of the separator line itself.
    pub separator_line_width: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            day_width: 6,
            day_padding: 2,
            separator_padding: 4,
            separator_line_width: 2,
        }
    }
}

impl LayoutParams {
    /// Full width of the gap that carries a separator.
    pub fn separator_width(&self) -> u32 {
        2 * self.separator_padding + self.separator_line_width
    }

    fn validate(&self) -> SleepGridResult<()> {
        if self.day_width == 0 {
            return Err(SleepGridError::validation("day_width must be >= 1"));
        }
        if self.separator_width() < self.day_padding {
            return Err(SleepGridError::validation(
                "separator width must be at least the day padding",
            ));
        }
        Ok(())
    }
}

/// Birthday alignment and how much of the timeline to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthPolicy {
    birthday_day: u32,
    max_months: u32,
}

impl MonthPolicy {
    /// Validated policy: `birthday_day` in `1..=31`, `max_months >= 1`.
    pub fn new(birthday_day: u32, max_months: u32) -> SleepGridResult<Self> {
        if !(1..=31).contains(&birthday_day) {
            return Err(SleepGridError::validation(format!(
                "birthday_day must be in 1..=31, got {birthday_day}"
            )));
        }
        if max_months == 0 {
            return Err(SleepGridError::validation("max_months must be >= 1"));
        }
        Ok(Self {
            birthday_day,
            max_months,
        })
    }

    /// Day of month that starts a new month of age.
    pub fn birthday_day(&self) -> u32 {
        self.birthday_day
    }

    /// Upper bound on displayed months.
    pub fn max_months(&self) -> u32 {
        self.max_months
    }
}

impl Default for MonthPolicy {
    fn default() -> Self {
        Self {
            birthday_day: 1,
            max_months: 24,
        }
    }
}

/// Day indices (never 0) whose calendar date falls on `birthday_day`, one per calendar month.
///
/// Months shorter than `birthday_day` simply have no boundary.
pub fn month_boundaries(day_zero: NaiveDate, total_days: u32, birthday_day: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let mut last_month = None;
    for day in 0..total_days {
        let Some(date) = day_zero.checked_add_signed(TimeDelta::days(i64::from(day))) else {
            break;
        };
        if date.day() != birthday_day {
            continue;
        }
        let key = (date.year(), date.month());
        if last_month != Some(key) {
            if day > 0 {
                out.push(day);
            }
            last_month = Some(key);
        }
    }
    out
}

/// Reference rows derived from the day start hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBands {
    /// First row of the 9am–5pm band.
    pub work_start: u32,
    /// One past the last row of the band. The band is empty when `work_end <= work_start`.
    pub work_end: u32,
    /// Row of midnight.
    pub midnight: u32,
}

impl RowBands {
    /// Bands for `params`: 9am, 5pm and midnight measured from the day start hour.
    pub fn for_params(params: GridParams) -> Self {
        let row_of = |hour: u32| {
            let hours_after_start = (hour + 24 - params.day_start_hour()) % 24;
            hours_after_start * 60 / params.bucket_minutes()
        };
        Self {
            work_start: row_of(9),
            work_end: row_of(17),
            midnight: row_of(24),
        }
    }

    /// Rows of the work-hours band.
    pub fn work_rows(&self) -> Range<u32> {
        self.work_start..self.work_end.max(self.work_start)
    }

    /// Rows covered by the midnight overlay (`midnight - 1 ..= midnight + 1`), clipped to `rows`.
    pub fn midnight_rows(&self, rows: u32) -> Range<u32> {
        self.midnight.saturating_sub(1)..(self.midnight + 2).min(rows)
    }
}

/// Complete geometry of one heatmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeatmapLayout {
    params: LayoutParams,
    grid: GridParams,
    day_zero: NaiveDate,
    displayed_days: u32,
    boundaries: Vec<u32>,
    total_cols: u32,
    rows: u32,
    bands: RowBands,
}

impl HeatmapLayout {
    /// Lay out `total_days` days starting at `day_zero`.
    ///
    /// When more than `max_months` boundaries exist, only the first `max_months` are kept and the
    /// displayed range ends just before the next boundary, so every displayed month is complete.
    #[tracing::instrument(skip_all, fields(total_days = total_days, day_zero = %day_zero))]
    pub fn compute(
        total_days: u32,
        day_zero: NaiveDate,
        policy: MonthPolicy,
        grid: GridParams,
        params: LayoutParams,
    ) -> SleepGridResult<Self> {
        params.validate()?;

        let mut boundaries = month_boundaries(day_zero, total_days, policy.birthday_day());
        tracing::info!(boundaries = boundaries.len(), "month boundaries (birthday-aligned)");

        let max = policy.max_months() as usize;
        let mut displayed_days = total_days;
        if boundaries.len() > max {
            displayed_days = displayed_days.min(boundaries[max]);
            boundaries.truncate(max);
            tracing::info!(
                max_months = policy.max_months(),
                displayed_days,
                "limited displayed range"
            );
        }
        if displayed_days == 0 {
            return Err(SleepGridError::evaluation("no days to lay out"));
        }

        let n = displayed_days;
        let total_cols = n * params.day_width
            + (n - 1) * params.day_padding
            + boundaries.len() as u32 * (params.separator_width() - params.day_padding);

        let layout = Self {
            params,
            grid,
            day_zero,
            displayed_days,
            boundaries,
            total_cols,
            rows: grid.rows_per_day(),
            bands: RowBands::for_params(grid),
        };
        tracing::info!(
            cols = layout.total_cols,
            rows = layout.rows,
            work_rows = ?layout.bands.work_rows(),
            midnight_row = layout.bands.midnight,
            "heatmap layout"
        );
        Ok(layout)
    }

    /// Geometry constants used.
    pub fn params(&self) -> LayoutParams {
        self.params
    }

    /// Grid resolution the rows were derived from.
    pub fn grid_params(&self) -> GridParams {
        self.grid
    }

    /// Calendar date of day index 0.
    pub fn day_zero(&self) -> NaiveDate {
        self.day_zero
    }

    /// Days drawn after truncation.
    pub fn displayed_days(&self) -> u32 {
        self.displayed_days
    }

    /// Month boundary day indices, ascending.
    pub fn boundaries(&self) -> &[u32] {
        &self.boundaries
    }

    /// Image width.
    pub fn total_cols(&self) -> u32 {
        self.total_cols
    }

    /// Image height: one row per bucket.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Reference rows.
    pub fn bands(&self) -> RowBands {
        self.bands
    }

    /// First column of `day`.
    pub fn col_offset(&self, day: u32) -> u32 {
        let crossed = self.boundaries.partition_point(|&b| b <= day) as u32;
        day * (self.params.day_width + self.params.day_padding)
            + crossed * (self.params.separator_width() - self.params.day_padding)
    }

    /// Columns painted for `day`, clipped to the image.
    pub fn day_columns(&self, day: u32) -> Range<u32> {
        let start = self.col_offset(day).min(self.total_cols);
        start..(start + self.params.day_width).min(self.total_cols)
    }

    /// First column of the separator line placed before `boundary_day`.
    pub fn separator_col(&self, boundary_day: u32) -> u32 {
        self.col_offset(boundary_day)
            .saturating_sub(self.params.separator_width() / 2)
    }

    /// `(boundary_day, line columns)` for every separator, clipped to the image.
    pub fn separators(&self) -> impl Iterator<Item = (u32, Range<u32>)> + '_ {
        self.boundaries.iter().map(|&b| {
            let col = self.separator_col(b).min(self.total_cols);
            (
                b,
                col..(col + self.params.separator_line_width).min(self.total_cols),
            )
        })
    }

    /// Rows spanned by separator lines: the middle half of the image.
    pub fn separator_rows(&self) -> Range<u32> {
        (self.rows / 4)..(self.rows * 3 / 4)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;

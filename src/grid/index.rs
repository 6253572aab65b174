//! Mapping from wall-clock timestamps to `(day, minute-of-day)` grid coordinates.
//!
//! A logical day starts at `day_start_hour:00` rather than at midnight. Everything in this module
//! is pure and total for valid [`GridParams`].

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::foundation::error::{SleepGridError, SleepGridResult};

/// Minutes in one logical day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Validated grid resolution: where a day starts and how wide a bucket is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridParams {
    day_start_hour: u32,
    bucket_minutes: u32,
}

impl GridParams {
    /// Original tool defaults: days start at 7am, 5-minute buckets.
    pub const DEFAULT_DAY_START_HOUR: u32 = 7;
    /// See [`GridParams::DEFAULT_DAY_START_HOUR`].
    pub const DEFAULT_BUCKET_MINUTES: u32 = 5;

    /// Create validated params. `bucket_minutes` must evenly divide a day.
    pub fn new(day_start_hour: u32, bucket_minutes: u32) -> SleepGridResult<Self> {
        if day_start_hour > 23 {
            return Err(SleepGridError::validation(format!(
                "day_start_hour must be in 0..=23, got {day_start_hour}"
            )));
        }
        if bucket_minutes == 0 || !MINUTES_PER_DAY.is_multiple_of(bucket_minutes) {
            return Err(SleepGridError::validation(format!(
                "bucket_minutes must be a positive divisor of {MINUTES_PER_DAY}, got {bucket_minutes}"
            )));
        }
        Ok(Self {
            day_start_hour,
            bucket_minutes,
        })
    }

    /// Hour of day at which a logical day begins.
    pub fn day_start_hour(self) -> u32 {
        self.day_start_hour
    }

    /// Bucket width in minutes.
    pub fn bucket_minutes(self) -> u32 {
        self.bucket_minutes
    }

    /// Number of buckets (grid rows) per logical day.
    pub fn rows_per_day(self) -> u32 {
        MINUTES_PER_DAY / self.bucket_minutes
    }

    /// Floor a minute-of-day down to its bucket start.
    pub fn floor_to_bucket(self, minute_of_day: u32) -> u32 {
        (minute_of_day / self.bucket_minutes) * self.bucket_minutes
    }
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            day_start_hour: Self::DEFAULT_DAY_START_HOUR,
            bucket_minutes: Self::DEFAULT_BUCKET_MINUTES,
        }
    }
}

/// Start of the logical day that `ts` belongs to.
///
/// Only the hour is compared: `06:59:59` with a 7am start belongs to the previous day.
pub fn day_boundary(ts: NaiveDateTime, day_start_hour: u32) -> NaiveDateTime {
    let start = NaiveTime::from_hms_opt(day_start_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let same_day = ts.date().and_time(start);
    if ts.hour() < day_start_hour {
        same_day - TimeDelta::days(1)
    } else {
        same_day
    }
}

/// Whole minutes elapsed since [`day_boundary`], always in `0..1440`.
pub fn minute_of_day(ts: NaiveDateTime, day_start_hour: u32) -> u32 {
    let delta = ts - day_boundary(ts, day_start_hour);
    // Non-negative by construction, so truncation is floor.
    delta.num_minutes().clamp(0, i64::from(MINUTES_PER_DAY - 1)) as u32
}

/// One grid cell address: logical day index and bucket-aligned minute-of-day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    /// Logical days since day zero.
    pub day: u32,
    /// Minute offset from the day boundary, a multiple of the bucket width.
    pub minute_of_day: u32,
}

impl BucketKey {
    /// Construct a key.
    pub fn new(day: u32, minute_of_day: u32) -> Self {
        Self { day, minute_of_day }
    }
}

/// Places timestamps on a grid anchored at `day_zero`.
#[derive(Clone, Copy, Debug)]
pub struct DayIndexer {
    day_zero: NaiveDateTime,
    params: GridParams,
}

impl DayIndexer {
    /// `day_zero` should itself be a day boundary; it is normalized if it is not.
    pub fn new(day_zero: NaiveDateTime, params: GridParams) -> Self {
        Self {
            day_zero: day_boundary(day_zero, params.day_start_hour()),
            params,
        }
    }

    /// The boundary of day index 0.
    pub fn day_zero(&self) -> NaiveDateTime {
        self.day_zero
    }

    /// Grid params in use.
    pub fn params(&self) -> GridParams {
        self.params
    }

    /// Signed day index of `ts`; negative before day zero.
    pub fn day_index(&self, ts: NaiveDateTime) -> i64 {
        (day_boundary(ts, self.params.day_start_hour()) - self.day_zero).num_days()
    }

    /// Bucket key for `ts`, or `None` when it falls before day zero or outside `u32` range.
    pub fn key_for(&self, ts: NaiveDateTime) -> Option<BucketKey> {
        let day = u32::try_from(self.day_index(ts)).ok()?;
        let minute = self
            .params
            .floor_to_bucket(minute_of_day(ts, self.params.day_start_hour()));
        Some(BucketKey::new(day, minute))
    }

    /// Bucket-aligned start of the bucket containing `ts`, with seconds discarded.
    pub fn bucket_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let dsh = self.params.day_start_hour();
        let minute = self.params.floor_to_bucket(minute_of_day(ts, dsh));
        day_boundary(ts, dsh) + TimeDelta::minutes(i64::from(minute))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/index.rs"]
mod tests;

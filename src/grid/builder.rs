//! Dense bucketed grid and its construction from events.

use chrono::NaiveDateTime;

use crate::{
    foundation::error::{SleepGridError, SleepGridResult},
    grid::{
        bucketize::{BucketizeStats, EventBucketizer, Occupancy},
        channel::{Channel, ChannelSet},
        event::Event,
        index::{BucketKey, GridParams, MINUTES_PER_DAY, day_boundary},
    },
};

/// Observed date range of an event set: the first day boundary and how many days follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateSpan {
    /// Minimum day boundary across all event starts.
    pub day_zero: NaiveDateTime,
    /// `(max boundary of ends-or-starts - day_zero) + 1` days.
    pub total_days: u32,
}

impl DateSpan {
    /// Derive the span from all events across all channels.
    ///
    /// Fails when `events` is empty: day zero is undefined.
    pub fn from_events(events: &[Event], params: GridParams) -> SleepGridResult<Self> {
        let dsh = params.day_start_hour();
        let day_zero = events
            .iter()
            .map(|e| day_boundary(e.start, dsh))
            .min()
            .ok_or_else(|| SleepGridError::input("no valid events found"))?;
        let last = events
            .iter()
            .map(|e| day_boundary(e.extent_end(), dsh))
            .max()
            .unwrap_or(day_zero)
            .max(day_zero);

        let days = (last - day_zero).num_days() + 1;
        let total_days = u32::try_from(days)
            .map_err(|_| SleepGridError::input(format!("event date range too large ({days} days)")))?;
        Ok(Self {
            day_zero,
            total_days,
        })
    }
}

/// Fully dense `(day, minute_of_day, channel) -> {0,1}` grid.
///
/// Storage is one bit-layer per channel, row-major by day then bucket. Every cell exists; cells
/// default to unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketGrid {
    bucket_minutes: u32,
    total_days: u32,
    channels: ChannelSet,
    layers: Vec<Vec<bool>>,
}

impl BucketGrid {
    /// All-zero grid covering `total_days` days.
    pub fn empty(bucket_minutes: u32, total_days: u32, channels: ChannelSet) -> SleepGridResult<Self> {
        if bucket_minutes == 0 || !MINUTES_PER_DAY.is_multiple_of(bucket_minutes) {
            return Err(SleepGridError::validation(format!(
                "bucket_minutes must be a positive divisor of {MINUTES_PER_DAY}, got {bucket_minutes}"
            )));
        }
        let cells = (total_days as usize) * ((MINUTES_PER_DAY / bucket_minutes) as usize);
        let layers = vec![vec![false; cells]; channels.len()];
        Ok(Self {
            bucket_minutes,
            total_days,
            channels,
            layers,
        })
    }

    /// Bucket width in minutes.
    pub fn bucket_minutes(&self) -> u32 {
        self.bucket_minutes
    }

    /// Number of logical days (columns of the heatmap before separators).
    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    /// Buckets per day.
    pub fn rows_per_day(&self) -> u32 {
        MINUTES_PER_DAY / self.bucket_minutes
    }

    /// Channels in canonical order.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Total number of cells: days × buckets × channels.
    pub fn cell_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    fn offset(&self, day: u32, row: u32) -> Option<usize> {
        if day >= self.total_days || row >= self.rows_per_day() {
            return None;
        }
        Some((day as usize) * (self.rows_per_day() as usize) + row as usize)
    }

    /// Value at `(channel_idx, day, row)`. Out-of-range reads are `false`.
    pub fn get(&self, channel_idx: usize, day: u32, row: u32) -> bool {
        match (self.layers.get(channel_idx), self.offset(day, row)) {
            (Some(layer), Some(off)) => layer[off],
            _ => false,
        }
    }

    /// Value at `key` on `channel`.
    pub fn is_set(&self, channel: &Channel, key: BucketKey) -> bool {
        match self.channels.position(channel) {
            Some(idx) => self.get(idx, key.day, key.minute_of_day / self.bucket_minutes),
            None => false,
        }
    }

    /// Set a cell. Out-of-range writes are skipped and reported as `false`.
    pub fn set(&mut self, channel_idx: usize, key: BucketKey) -> bool {
        if !key.minute_of_day.is_multiple_of(self.bucket_minutes) {
            return false;
        }
        let row = key.minute_of_day / self.bucket_minutes;
        let Some(off) = self.offset(key.day, row) else {
            return false;
        };
        match self.layers.get_mut(channel_idx) {
            Some(layer) => {
                layer[off] = true;
                true
            }
            None => false,
        }
    }

    /// Union a sparse occupancy into this grid. Cells never clear.
    pub fn apply(&mut self, occupancy: &Occupancy) -> u64 {
        let mut skipped = 0u64;
        for (idx, set) in occupancy.sets.iter().enumerate() {
            for key in set {
                if !self.set(idx, *key) {
                    skipped += 1;
                }
            }
        }
        skipped
    }

    /// Number of set cells on channel `channel_idx`, optionally limited to the first `days` days.
    pub fn occupied(&self, channel_idx: usize, days: Option<u32>) -> usize {
        let Some(layer) = self.layers.get(channel_idx) else {
            return 0;
        };
        let days = days.unwrap_or(self.total_days).min(self.total_days);
        let end = (days as usize) * (self.rows_per_day() as usize);
        layer[..end].iter().filter(|&&b| b).count()
    }

    /// Iterate dense rows in `(day, minute_of_day)` order, each with one bit per channel.
    pub fn rows(&self) -> impl Iterator<Item = (BucketKey, Vec<bool>)> + '_ {
        let per_day = self.rows_per_day();
        (0..self.total_days).flat_map(move |day| {
            (0..per_day).map(move |row| {
                let bits = (0..self.layers.len())
                    .map(|idx| self.get(idx, day, row))
                    .collect();
                (BucketKey::new(day, row * self.bucket_minutes), bits)
            })
        })
    }

    /// Aggregate counters for logging.
    pub fn summary(&self) -> GridSummary {
        let total_buckets = self.total_days as u64 * u64::from(self.rows_per_day());
        let asleep = self
            .channels
            .position(&Channel::Asleep)
            .map_or(0, |idx| self.occupied(idx, None)) as u64;
        let feed = self
            .channels
            .position(&Channel::Feed)
            .map_or(0, |idx| self.occupied(idx, None)) as u64;
        GridSummary {
            total_days: self.total_days,
            total_buckets,
            asleep_buckets: asleep,
            feed_buckets: feed,
            bucket_minutes: self.bucket_minutes,
        }
    }
}

/// Headline numbers about a built grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSummary {
    /// Days covered.
    pub total_days: u32,
    /// Days × buckets per day.
    pub total_buckets: u64,
    /// Buckets marked asleep.
    pub asleep_buckets: u64,
    /// Buckets with a feed.
    pub feed_buckets: u64,
    /// Bucket width.
    pub bucket_minutes: u32,
}

impl GridSummary {
    /// Share of buckets marked asleep, in percent.
    pub fn asleep_percent(&self) -> f64 {
        if self.total_buckets == 0 {
            return 0.0;
        }
        100.0 * self.asleep_buckets as f64 / self.total_buckets as f64
    }

    /// Mean minutes asleep per day.
    pub fn sleep_minutes_per_day(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        (self.asleep_buckets * u64::from(self.bucket_minutes)) as f64 / f64::from(self.total_days)
    }

    /// Mean feeds per day.
    pub fn feeds_per_day(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        self.feed_buckets as f64 / f64::from(self.total_days)
    }

    /// Emit the summary at info level.
    pub fn log(&self) {
        tracing::info!(
            total_buckets = self.total_buckets,
            asleep_buckets = self.asleep_buckets,
            asleep_percent = %format!("{:.2}", self.asleep_percent()),
            feed_buckets = self.feed_buckets,
            sleep_hours_per_day = %format!("{:.1}", self.sleep_minutes_per_day() / 60.0),
            feeds_per_day = %format!("{:.2}", self.feeds_per_day()),
            "grid summary"
        );
    }
}

/// Result of building a grid from events.
#[derive(Clone, Debug)]
pub struct BuildOutcome {
    /// The canonical dense grid.
    pub grid: BucketGrid,
    /// Boundary of day index 0.
    pub day_zero: NaiveDateTime,
    /// Recoverable conditions met while bucketizing.
    pub stats: BucketizeStats,
}

/// Builds the dense grid spanning the full observed date range of an event set.
#[derive(Clone, Debug)]
pub struct BucketGridBuilder {
    params: GridParams,
    channels: ChannelSet,
}

impl BucketGridBuilder {
    /// Builder for `channels` at resolution `params`.
    pub fn new(params: GridParams, channels: ChannelSet) -> Self {
        Self { params, channels }
    }

    /// Span, bucketize and densify in one step.
    #[tracing::instrument(skip_all, fields(events = events.len()))]
    pub fn build(&self, events: &[Event]) -> SleepGridResult<BuildOutcome> {
        let span = DateSpan::from_events(events, self.params)?;
        tracing::info!(day_zero = %span.day_zero, total_days = span.total_days, "date span");

        let occupancy = EventBucketizer::new(span, self.params, &self.channels).bucketize(events);
        let grid = self.densify(&occupancy)?;
        tracing::info!(cells = grid.cell_count(), "built dense grid");

        Ok(BuildOutcome {
            grid,
            day_zero: span.day_zero,
            stats: occupancy.stats,
        })
    }

    /// Allocate the dense grid for `occupancy.span` and union every channel's cells into it.
    pub fn densify(&self, occupancy: &Occupancy) -> SleepGridResult<BucketGrid> {
        let mut grid = BucketGrid::empty(
            self.params.bucket_minutes(),
            occupancy.span.total_days,
            self.channels.clone(),
        )?;
        let skipped = grid.apply(occupancy);
        if skipped > 0 {
            tracing::debug!(skipped, "occupied cells outside the grid were not written");
        }
        Ok(grid)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/builder.rs"]
mod tests;

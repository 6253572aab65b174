//! Event → sparse per-channel occupancy.

use std::collections::HashSet;

use chrono::{NaiveDateTime, TimeDelta};
use rayon::prelude::*;

use crate::grid::{
    builder::DateSpan,
    channel::{Channel, ChannelSet, OTHER_MEDICATION},
    event::{Event, EventKind},
    index::{BucketKey, DayIndexer, GridParams},
};

/// Occupied cells of one channel.
pub type BucketSet = HashSet<BucketKey>;

/// Counters for recoverable conditions met while bucketizing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketizeStats {
    /// Sleep events with `end <= start` (or no end); they occupy nothing.
    pub degenerate_intervals: u64,
    /// Cells that fell outside `[0, total_days)` and were not written.
    pub out_of_range_cells: u64,
    /// Medication events whose channel is not configured; routed to `Other`.
    pub rerouted_events: u64,
}

impl BucketizeStats {
    fn merge(&mut self, other: BucketizeStats) {
        self.degenerate_intervals += other.degenerate_intervals;
        self.out_of_range_cells += other.out_of_range_cells;
        self.rerouted_events += other.rerouted_events;
    }
}

/// Sparse occupancy for every channel, aligned with [`ChannelSet::channels`].
#[derive(Clone, Debug)]
pub struct Occupancy {
    /// Coordinate system shared by all channels.
    pub span: DateSpan,
    /// One set per channel, in channel order.
    pub sets: Vec<BucketSet>,
    /// Recoverable conditions.
    pub stats: BucketizeStats,
}

impl Occupancy {
    /// Occupied cells of `channel`, if it is part of the set this was built with.
    pub fn cells(&self, channels: &ChannelSet, channel: &Channel) -> Option<&BucketSet> {
        channels.position(channel).and_then(|idx| self.sets.get(idx))
    }
}

/// Maps typed events onto bucket keys at a fixed resolution.
#[derive(Clone, Debug)]
pub struct EventBucketizer<'a> {
    indexer: DayIndexer,
    total_days: u32,
    channels: &'a ChannelSet,
}

impl<'a> EventBucketizer<'a> {
    /// Bucketize into the coordinate system described by `span`.
    pub fn new(span: DateSpan, params: GridParams, channels: &'a ChannelSet) -> Self {
        Self {
            indexer: DayIndexer::new(span.day_zero, params),
            total_days: span.total_days,
            channels,
        }
    }

    /// The span this bucketizer writes into.
    pub fn span(&self) -> DateSpan {
        DateSpan {
            day_zero: self.indexer.day_zero(),
            total_days: self.total_days,
        }
    }

    /// Bucketize every event. Channels are processed independently in parallel; the result does
    /// not depend on scheduling because each set is a union.
    #[tracing::instrument(skip_all, fields(events = events.len(), channels = self.channels.len()))]
    pub fn bucketize(&self, events: &[Event]) -> Occupancy {
        let routes: Vec<(usize, bool)> = events.iter().map(|e| self.route(e)).collect();

        let per_channel: Vec<(BucketSet, BucketizeStats)> = (0..self.channels.len())
            .into_par_iter()
            .map(|channel_idx| {
                let mut set = BucketSet::new();
                let mut stats = BucketizeStats::default();
                for (event, &(route, rerouted)) in events.iter().zip(&routes) {
                    if route != channel_idx {
                        continue;
                    }
                    if rerouted {
                        stats.rerouted_events += 1;
                    }
                    let (cells, event_stats) = self.cells_for(event);
                    stats.merge(event_stats);
                    set.extend(cells);
                }
                (set, stats)
            })
            .collect();

        let mut stats = BucketizeStats::default();
        let mut sets = Vec::with_capacity(per_channel.len());
        for (set, s) in per_channel {
            stats.merge(s);
            sets.push(set);
        }

        for (channel, set) in self.channels.channels().iter().zip(&sets) {
            if !set.is_empty() {
                tracing::info!(channel = %channel, cells = set.len(), "marked buckets");
            }
        }
        if stats.degenerate_intervals > 0 || stats.out_of_range_cells > 0 {
            tracing::debug!(
                degenerate = stats.degenerate_intervals,
                out_of_range = stats.out_of_range_cells,
                "bucketize skipped cells"
            );
        }

        Occupancy {
            span: self.span(),
            sets,
            stats,
        }
    }

    /// In-range cells occupied by a single event.
    pub fn cells_for(&self, event: &Event) -> (Vec<BucketKey>, BucketizeStats) {
        let mut stats = BucketizeStats::default();
        let mut cells = Vec::new();

        match (&event.kind, event.end) {
            (EventKind::Sleep, Some(end)) if end > event.start => {
                self.interval_cells(event.start, end, &mut cells, &mut stats);
            }
            (EventKind::Sleep, _) => {
                tracing::debug!(start = %event.start, end = ?event.end, "degenerate sleep interval");
                stats.degenerate_intervals += 1;
            }
            (EventKind::Feed | EventKind::Med(_), _) => match self.in_range(event.start) {
                Some(key) => cells.push(key),
                None => stats.out_of_range_cells += 1,
            },
        }

        (cells, stats)
    }

    // Walk bucket starts from the floored start while they precede the raw end, so a sleep ending
    // mid-bucket still marks that bucket.
    fn interval_cells(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        cells: &mut Vec<BucketKey>,
        stats: &mut BucketizeStats,
    ) {
        let step_minutes = i64::from(self.indexer.params().bucket_minutes());
        let step = TimeDelta::minutes(step_minutes);
        let mut cursor = self.indexer.bucket_start(start);

        while cursor < end {
            if self.indexer.day_index(cursor) >= i64::from(self.total_days) {
                let remaining = (end - cursor).num_seconds();
                let step_secs = step_minutes * 60;
                stats.out_of_range_cells += ((remaining + step_secs - 1) / step_secs) as u64;
                break;
            }
            match self.in_range(cursor) {
                Some(key) => cells.push(key),
                None => stats.out_of_range_cells += 1,
            }
            cursor += step;
        }
    }

    fn in_range(&self, ts: NaiveDateTime) -> Option<BucketKey> {
        self.indexer
            .key_for(ts)
            .filter(|key| key.day < self.total_days)
    }

    fn route(&self, event: &Event) -> (usize, bool) {
        if let Some(idx) = self.channels.position(&event.channel()) {
            return (idx, false);
        }
        let other = Channel::Med(OTHER_MEDICATION.to_owned());
        // `Other` is always present.
        let idx = self.channels.position(&other).unwrap_or(self.channels.len() - 1);
        (idx, true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/bucketize.rs"]
mod tests;

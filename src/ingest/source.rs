//! Tracking-app CSV export → typed [`Event`]s.
//!
//! Column and event-type names are configurable so exports from different apps can be read
//! without preprocessing. Rows that cannot be turned into an event are dropped with a warning;
//! rows of kinds we do not track are ignored.

use std::{collections::BTreeMap, fs, io::Read, path::Path};

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord};

use crate::{
    foundation::error::{SleepGridError, SleepGridResult},
    grid::{channel::ChannelSet, event::Event},
    ingest::timestamp::parse_timestamp,
};

/// Where to find things in the input table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    /// Column holding the event kind.
    pub type_column: String,
    /// Column holding the start timestamp.
    pub start_column: String,
    /// Column holding the end timestamp (sleep only).
    pub end_column: String,
    /// Column holding the free-text medication label.
    pub med_name_column: String,
    /// Kind value for sleep rows.
    pub sleep_type: String,
    /// Kind value for feeding rows.
    pub feed_type: String,
    /// Kind value for medication rows.
    pub meds_type: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            type_column: "Type".to_owned(),
            start_column: "Start".to_owned(),
            end_column: "End".to_owned(),
            med_name_column: "Start Location".to_owned(),
            sleep_type: "sleep".to_owned(),
            feed_type: "feed".to_owned(),
            meds_type: "meds".to_owned(),
        }
    }
}

/// Counts gathered while reading an export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Data rows read (excluding the header).
    pub rows: usize,
    /// Valid sleep intervals.
    pub sleeps: usize,
    /// Valid feeds.
    pub feeds: usize,
    /// Valid medication doses.
    pub meds: usize,
    /// Medication doses per canonical type.
    pub medications: BTreeMap<String, usize>,
    /// Rows of a tracked kind that could not be used.
    pub dropped: usize,
    /// Rows of an untracked kind.
    pub ignored: usize,
}

impl IngestReport {
    /// Total valid events.
    pub fn events(&self) -> usize {
        self.sleeps + self.feeds + self.meds
    }
}

/// Events read from an export, with the report describing them.
#[derive(Clone, Debug)]
pub struct LoadedEvents {
    /// Events in input order.
    pub events: Vec<Event>,
    /// What was kept, dropped and ignored.
    pub report: IngestReport,
}

struct Columns {
    kind: usize,
    start: usize,
    end: Option<usize>,
    med_name: Option<usize>,
}

impl Columns {
    fn resolve(header: &StringRecord, cfg: &SourceConfig) -> SleepGridResult<Self> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            find(name).ok_or_else(|| {
                SleepGridError::input(format!("missing required column '{name}' in input"))
            })
        };
        let cols = Self {
            kind: required(&cfg.type_column)?,
            start: required(&cfg.start_column)?,
            end: find(&cfg.end_column),
            med_name: find(&cfg.med_name_column),
        };
        if cols.end.is_none() {
            tracing::warn!(column = %cfg.end_column, "end column not found; sleep rows will be dropped");
        }
        if cols.med_name.is_none() {
            tracing::warn!(column = %cfg.med_name_column, "medication column not found; doses map to Other");
        }
        Ok(cols)
    }
}

fn field<'r>(rec: &'r StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| rec.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Read events from CSV `input`.
///
/// Fails only when the kind or start column is missing; everything else is recovered row by row.
#[tracing::instrument(skip_all)]
pub fn read_events<R: Read>(
    input: R,
    cfg: &SourceConfig,
    channels: &ChannelSet,
) -> SleepGridResult<LoadedEvents> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let header = reader.headers().context("read input header")?.clone();
    let cols = Columns::resolve(&header, cfg)?;

    let mut events = Vec::new();
    let mut report = IngestReport::default();

    for (i, rec) in reader.records().enumerate() {
        report.rows += 1;
        // Header is line 1.
        let line = i + 2;
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) => {
                tracing::warn!(line, error = %err, "dropping unreadable row");
                report.dropped += 1;
                continue;
            }
        };

        let kind = field(&rec, Some(cols.kind)).unwrap_or_default();
        let is_sleep = kind == cfg.sleep_type;
        let is_feed = kind == cfg.feed_type;
        let is_meds = kind == cfg.meds_type;
        if !(is_sleep || is_feed || is_meds) {
            report.ignored += 1;
            continue;
        }

        let Some(start) = field(&rec, Some(cols.start)).and_then(parse_timestamp) else {
            tracing::warn!(line, kind, "dropping row: missing or invalid start timestamp");
            report.dropped += 1;
            continue;
        };

        if is_sleep {
            let Some(raw_end) = field(&rec, cols.end) else {
                tracing::warn!(line, "dropping sleep row: no end timestamp");
                report.dropped += 1;
                continue;
            };
            let Some(end) = parse_timestamp(raw_end) else {
                tracing::warn!(line, end = raw_end, "dropping sleep row: invalid end timestamp");
                report.dropped += 1;
                continue;
            };
            report.sleeps += 1;
            events.push(Event::sleep(start, end));
        } else if is_feed {
            report.feeds += 1;
            events.push(Event::feed(start));
        } else {
            let label = field(&rec, cols.med_name).map(|s| s.replace('"', ""));
            let name = channels.normalize_medication(label.as_deref());
            *report.medications.entry(name.clone()).or_default() += 1;
            report.meds += 1;
            events.push(Event::med(name, start));
        }
    }

    tracing::info!(
        rows = report.rows,
        sleeps = report.sleeps,
        feeds = report.feeds,
        meds = report.meds,
        dropped = report.dropped,
        ignored = report.ignored,
        "loaded events"
    );
    if !report.medications.is_empty() {
        tracing::info!(types = ?report.medications, "medication types");
    }
    Ok(LoadedEvents { events, report })
}

/// Read events from the CSV file at `path`.
pub fn load_events(
    path: &Path,
    cfg: &SourceConfig,
    channels: &ChannelSet,
) -> SleepGridResult<LoadedEvents> {
    let file =
        fs::File::open(path).with_context(|| format!("open input '{}'", path.display()))?;
    read_events(std::io::BufReader::new(file), cfg, channels)
}

#[cfg(test)]
#[path = "../../tests/unit/ingest/source.rs"]
mod tests;

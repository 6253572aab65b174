//! Bucketed CSV artifact: the dense grid written as one row per `(day, minute_of_day)` cell.
//!
//! Header is `day,minute_of_day,asleep,feed,med_<type>...,med_Other`; values are `0`/`1`. Reading
//! the artifact back yields a [`BucketGrid`] identical to the one written.

use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::{
    foundation::error::{SleepGridError, SleepGridResult},
    grid::{
        builder::BucketGrid,
        channel::{Channel, ChannelSet},
        index::{BucketKey, MINUTES_PER_DAY},
    },
};

const DAY_COLUMN: &str = "day";
const MINUTE_COLUMN: &str = "minute_of_day";

/// Write `grid` as CSV to `out`.
pub fn write_csv<W: Write>(grid: &BucketGrid, out: W) -> SleepGridResult<()> {
    let mut writer = WriterBuilder::new().from_writer(out);

    let mut header = vec![DAY_COLUMN.to_owned(), MINUTE_COLUMN.to_owned()];
    header.extend(grid.channels().channels().iter().map(Channel::column_name));
    writer
        .write_record(&header)
        .context("write bucket artifact header")?;

    let mut record = Vec::with_capacity(header.len());
    for (key, bits) in grid.rows() {
        record.clear();
        record.push(key.day.to_string());
        record.push(key.minute_of_day.to_string());
        record.extend(bits.iter().map(|&b| if b { "1" } else { "0" }.to_owned()));
        writer
            .write_record(&record)
            .with_context(|| format!("write bucket row day={} minute={}", key.day, key.minute_of_day))?;
    }
    writer.flush().context("flush bucket artifact")?;
    Ok(())
}

/// Write `grid` to `path`, creating parent directories.
#[tracing::instrument(skip(grid), fields(path = %path.display()))]
pub fn save_csv(grid: &BucketGrid, path: &Path) -> SleepGridResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let file = fs::File::create(path)
        .with_context(|| format!("create bucket artifact '{}'", path.display()))?;
    write_csv(grid, std::io::BufWriter::new(file))?;

    let summary = grid.summary();
    tracing::info!(rows = summary.total_buckets, "saved bucketed data");
    Ok(())
}

/// Read a grid previously produced by [`write_csv`].
///
/// The channel list comes from the header; the bucket width is inferred from the minute step.
/// Rows must be dense and sorted by `(day, minute_of_day)`, with binary values.
pub fn read_csv<R: Read>(input: R) -> SleepGridResult<BucketGrid> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    let header = reader
        .headers()
        .context("read bucket artifact header")?
        .clone();
    let (channels, columns) = channels_from_header(&header)?;

    let records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, _>>()
        .context("read bucket artifact rows")?;
    if records.is_empty() {
        return Err(SleepGridError::serde("bucket artifact has no rows"));
    }

    let keys = records
        .iter()
        .enumerate()
        .map(|(i, rec)| parse_key(rec, i))
        .collect::<SleepGridResult<Vec<BucketKey>>>()?;
    let bucket_minutes = infer_bucket_minutes(&keys)?;
    let rows_per_day = (MINUTES_PER_DAY / bucket_minutes) as usize;

    if !keys.len().is_multiple_of(rows_per_day) {
        return Err(SleepGridError::serde(format!(
            "bucket artifact is not dense: {} rows is not a whole number of {rows_per_day}-row days",
            keys.len()
        )));
    }
    let total_days = u32::try_from(keys.len() / rows_per_day)
        .map_err(|_| SleepGridError::serde("bucket artifact has too many days"))?;

    let mut grid = BucketGrid::empty(bucket_minutes, total_days, channels)?;
    for (i, (rec, key)) in records.iter().zip(&keys).enumerate() {
        let expected = BucketKey::new(
            (i / rows_per_day) as u32,
            (i % rows_per_day) as u32 * bucket_minutes,
        );
        if *key != expected {
            return Err(SleepGridError::serde(format!(
                "bucket artifact row {} is ({}, {}), expected ({}, {}): rows must be dense and sorted",
                i + 1,
                key.day,
                key.minute_of_day,
                expected.day,
                expected.minute_of_day
            )));
        }
        for &(field, channel_idx) in &columns {
            match rec.get(field).map(str::trim) {
                Some("1") => {
                    grid.set(channel_idx, *key);
                }
                Some("0") => {}
                other => {
                    return Err(SleepGridError::serde(format!(
                        "bucket artifact row {} column '{}': expected 0 or 1, got {:?}",
                        i + 1,
                        header.get(field).unwrap_or_default(),
                        other.unwrap_or_default()
                    )));
                }
            }
        }
    }

    tracing::info!(
        rows = keys.len(),
        total_days,
        bucket_minutes,
        channels = grid.channels().len(),
        "loaded bucketed data"
    );
    Ok(grid)
}

/// Read a grid from `path`.
pub fn load_csv(path: &Path) -> SleepGridResult<BucketGrid> {
    let file = fs::File::open(path)
        .with_context(|| format!("open bucket artifact '{}'", path.display()))?;
    read_csv(std::io::BufReader::new(file))
}

// Map header columns to channel positions. `asleep` and `feed` are required; `med_Other` is
// added by `ChannelSet` when absent and stays all-zero.
fn channels_from_header(header: &StringRecord) -> SleepGridResult<(ChannelSet, Vec<(usize, usize)>)> {
    if header.get(0) != Some(DAY_COLUMN) || header.get(1) != Some(MINUTE_COLUMN) {
        return Err(SleepGridError::serde(format!(
            "bucket artifact must start with '{DAY_COLUMN},{MINUTE_COLUMN}'"
        )));
    }

    let mut parsed = Vec::new();
    for (field, name) in header.iter().enumerate().skip(2) {
        let channel = Channel::from_column_name(name).ok_or_else(|| {
            SleepGridError::serde(format!("unknown bucket artifact column '{name}'"))
        })?;
        if parsed.iter().any(|(_, c)| *c == channel) {
            return Err(SleepGridError::serde(format!(
                "duplicate bucket artifact column '{name}'"
            )));
        }
        parsed.push((field, channel));
    }
    for required in [Channel::Asleep, Channel::Feed] {
        if !parsed.iter().any(|(_, c)| *c == required) {
            return Err(SleepGridError::serde(format!(
                "bucket artifact is missing column '{required}'"
            )));
        }
    }

    let channels = ChannelSet::new(parsed.iter().filter_map(|(_, c)| c.medication()));
    let columns = parsed
        .iter()
        .map(|(field, channel)| {
            channels
                .position(channel)
                .map(|idx| (*field, idx))
                .ok_or_else(|| SleepGridError::serde(format!("unusable column '{channel}'")))
        })
        .collect::<SleepGridResult<Vec<_>>>()?;
    Ok((channels, columns))
}

fn parse_key(rec: &StringRecord, i: usize) -> SleepGridResult<BucketKey> {
    let field = |idx: usize, name: &str| -> SleepGridResult<u32> {
        let raw = rec.get(idx).unwrap_or_default().trim();
        raw.parse::<u32>().map_err(|_| {
            SleepGridError::serde(format!(
                "bucket artifact row {}: invalid {name} '{raw}'",
                i + 1
            ))
        })
    };
    Ok(BucketKey::new(field(0, DAY_COLUMN)?, field(1, MINUTE_COLUMN)?))
}

fn infer_bucket_minutes(keys: &[BucketKey]) -> SleepGridResult<u32> {
    let step = match keys.get(1) {
        Some(next) if next.day == keys[0].day => next.minute_of_day.saturating_sub(keys[0].minute_of_day),
        // A single row per day means one bucket spans the whole day.
        _ => MINUTES_PER_DAY,
    };
    if step == 0 || !MINUTES_PER_DAY.is_multiple_of(step) {
        return Err(SleepGridError::serde(format!(
            "cannot infer bucket width: minute step {step} does not divide a day"
        )));
    }
    Ok(step)
}

#[cfg(test)]
#[path = "../../tests/unit/grid/artifact.rs"]
mod tests;

//! The configuration file: input column names, event kind names, the medication catalog and
//! palette overrides.
//!
//! Every field is optional. A document with only `visualization.colors.sleep` set is valid and
//! leaves everything else at its default.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    config::color::ColorDef,
    foundation::error::{SleepGridError, SleepGridResult},
    grid::channel::{ChannelSet, DEFAULT_MEDICATIONS},
    ingest::source::SourceConfig,
    render::compositor::HeatmapPalette,
};

/// Top-level configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepGridConfig {
    /// Informational name of the data source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Input column names.
    pub columns: ColumnNames,
    /// Values of the type column.
    pub event_types: EventTypeNames,
    /// Column holding the medication label.
    pub med_name_column: String,
    /// Known medications, in paint order. `Other` is implied.
    pub medication_types: Vec<String>,
    /// Rendering options.
    pub visualization: Visualization,
}

impl Default for SleepGridConfig {
    fn default() -> Self {
        Self {
            name: None,
            columns: ColumnNames::default(),
            event_types: EventTypeNames::default(),
            med_name_column: "Start Location".to_owned(),
            medication_types: DEFAULT_MEDICATIONS.iter().map(|m| (*m).to_owned()).collect(),
            visualization: Visualization::default(),
        }
    }
}

/// Input CSV column names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Event kind column.
    #[serde(rename = "type")]
    pub kind: String,
    /// Start timestamp column.
    pub start: String,
    /// End timestamp column; empty for point events.
    pub end: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            kind: "Type".to_owned(),
            start: "Start".to_owned(),
            end: "End".to_owned(),
        }
    }
}

/// Values of the kind column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTypeNames {
    /// Kind value for sleep intervals.
    pub sleep: String,
    /// Kind value for feeds.
    pub feed: String,
    /// Kind value for medication doses.
    pub meds: String,
}

impl Default for EventTypeNames {
    fn default() -> Self {
        Self {
            sleep: "sleep".to_owned(),
            feed: "feed".to_owned(),
            meds: "meds".to_owned(),
        }
    }
}

/// Rendering section of the document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visualization {
    /// Palette overrides.
    pub colors: ColorConfig,
}

/// Palette overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Sleep cells.
    pub sleep: ColorDef,
    /// Feed cells.
    pub feed: ColorDef,
    /// Month separator columns.
    pub separator: ColorDef,
    /// Work-hours band tint.
    pub work_hours: ColorDef,
    /// Per-medication colors; unnamed medications use the built-in table.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub medications: BTreeMap<String, ColorDef>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        let p = HeatmapPalette::default();
        Self {
            sleep: p.sleep.into(),
            feed: p.feed.into(),
            separator: p.separator.into(),
            work_hours: p.work_hours.into(),
            medications: BTreeMap::new(),
        }
    }
}

impl SleepGridConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(s: &str) -> SleepGridResult<Self> {
        serde_yaml::from_str(s)
            .map_err(|e| SleepGridError::validation(format!("parse config YAML: {e}")))
    }

    /// Parse a JSON document.
    pub fn from_json_str(s: &str) -> SleepGridResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| SleepGridError::validation(format!("parse config JSON: {e}")))
    }

    /// Load from disk; `.json` files are read as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> SleepGridResult<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let cfg = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
        .map_err(|e| SleepGridError::validation(format!("{}: {e}", path.display())))?;

        tracing::info!(
            path = %path.display(),
            name = cfg.name.as_deref().unwrap_or("-"),
            medications = cfg.medication_types.len(),
            "loaded config"
        );
        Ok(cfg)
    }

    /// Load `path` if it exists. A missing file is not an error: defaults are used with a warning.
    pub fn load_or_default(path: Option<&Path>) -> SleepGridResult<Self> {
        match path {
            None => Ok(Self::default()),
            Some(p) if !p.exists() => {
                tracing::warn!(path = %p.display(), "config file not found; using defaults");
                Ok(Self::default())
            }
            Some(p) => Self::from_path(p),
        }
    }

    /// The channel catalog implied by `medication_types`.
    pub fn channels(&self) -> ChannelSet {
        ChannelSet::new(&self.medication_types)
    }

    /// Column and kind names for the event reader.
    pub fn source(&self) -> SourceConfig {
        SourceConfig {
            type_column: self.columns.kind.clone(),
            start_column: self.columns.start.clone(),
            end_column: self.columns.end.clone(),
            med_name_column: self.med_name_column.clone(),
            sleep_type: self.event_types.sleep.clone(),
            feed_type: self.event_types.feed.clone(),
            meds_type: self.event_types.meds.clone(),
        }
    }

    /// Compositor colors with the configured overrides applied.
    pub fn palette(&self) -> HeatmapPalette {
        let colors = &self.visualization.colors;
        HeatmapPalette {
            sleep: colors.sleep.rgba8(),
            feed: colors.feed.rgba8(),
            separator: colors.separator.rgba8(),
            work_hours: colors.work_hours.rgba8(),
            medications: colors
                .medications
                .iter()
                .map(|(name, c)| (name.clone(), c.rgba8()))
                .collect(),
            ..HeatmapPalette::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/file.rs"]
mod tests;

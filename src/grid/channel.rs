//! Tracked signals and the medication catalog that names them.

use std::fmt;

/// Name of the catch-all medication channel.
pub const OTHER_MEDICATION: &str = "Other";

/// Known medications when no configuration overrides them.
pub const DEFAULT_MEDICATIONS: &[&str] = &[
    "Tylenol",
    "Pepcid",
    "Gas Relief Drops",
    "Gripe Water",
    "Vitamin D",
    "Probiotics",
    "Motrin",
];

// Substring aliases, checked case-insensitively and in order, before the exact-name lookup.
const MEDICATION_ALIASES: &[(&str, &str)] = &[
    ("tylenol", "Tylenol"),
    ("ibuprofen", "Motrin"),
    ("motrin", "Motrin"),
];

/// One independent 0/1 layer over the grid.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Sleep intervals.
    Asleep,
    /// Feeding events.
    Feed,
    /// A canonical medication type (including [`OTHER_MEDICATION`]).
    Med(String),
}

impl Channel {
    /// Column name in the bucketed artifact.
    pub fn column_name(&self) -> String {
        match self {
            Channel::Asleep => "asleep".to_owned(),
            Channel::Feed => "feed".to_owned(),
            Channel::Med(name) => format!("med_{name}"),
        }
    }

    /// Inverse of [`Channel::column_name`].
    pub fn from_column_name(col: &str) -> Option<Self> {
        match col {
            "asleep" => Some(Channel::Asleep),
            "feed" => Some(Channel::Feed),
            _ => col
                .strip_prefix("med_")
                .filter(|name| !name.is_empty())
                .map(|name| Channel::Med(name.to_owned())),
        }
    }

    /// Medication name for `Med` channels.
    pub fn medication(&self) -> Option<&str> {
        match self {
            Channel::Med(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

/// Ordered set of channels shared by the bucketizer, the grid and the compositor.
///
/// Order is fixed: `asleep`, `feed`, one channel per known medication in configuration order,
/// then `med_Other`. The compositor paints medications in this order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelSet {
    medications: Vec<String>,
    channels: Vec<Channel>,
}

impl ChannelSet {
    /// Build from a list of medication names. Blank and duplicate names are dropped and `Other`
    /// is always present exactly once, last.
    pub fn new<I, S>(medications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut meds = Vec::<String>::new();
        for name in medications {
            let name = name.as_ref().trim();
            if name.is_empty() || name == OTHER_MEDICATION || meds.iter().any(|m| m == name) {
                continue;
            }
            meds.push(name.to_owned());
        }
        Self::assemble(meds)
    }

    fn assemble(meds: Vec<String>) -> Self {
        let mut channels = Vec::with_capacity(meds.len() + 3);
        channels.push(Channel::Asleep);
        channels.push(Channel::Feed);
        channels.extend(meds.iter().cloned().map(Channel::Med));
        channels.push(Channel::Med(OTHER_MEDICATION.to_owned()));

        Self {
            medications: meds,
            channels,
        }
    }

    /// All channels in canonical order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Number of channels (including `asleep`, `feed` and `med_Other`).
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false: `asleep`, `feed` and `med_Other` are always present.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Position of `channel` in canonical order.
    pub fn position(&self, channel: &Channel) -> Option<usize> {
        self.channels.iter().position(|c| c == channel)
    }

    /// Known medication names, without `Other`.
    pub fn medications(&self) -> &[String] {
        &self.medications
    }

    /// Medication channels (known types then `Other`), in paint order.
    pub fn medication_channels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| c.medication().map(|name| (idx, name)))
    }

    /// Map a free-text medication label to a canonical medication channel name.
    ///
    /// Aliases win over exact matches; a canonical alias that is not a known medication falls
    /// through to `Other` so every event lands on an existing channel.
    pub fn normalize_medication(&self, label: Option<&str>) -> String {
        let Some(label) = label.map(str::trim).filter(|s| !s.is_empty()) else {
            return OTHER_MEDICATION.to_owned();
        };

        let lower = label.to_lowercase();
        if let Some((_, canonical)) = MEDICATION_ALIASES
            .iter()
            .find(|(needle, _)| lower.contains(needle))
        {
            return if self.is_known(canonical) {
                (*canonical).to_owned()
            } else {
                OTHER_MEDICATION.to_owned()
            };
        }

        if self.is_known(label) {
            label.to_owned()
        } else {
            OTHER_MEDICATION.to_owned()
        }
    }

    fn is_known(&self, name: &str) -> bool {
        self.medications.iter().any(|m| m == name)
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::assemble(DEFAULT_MEDICATIONS.iter().map(|m| (*m).to_owned()).collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/channel.rs"]
mod tests;

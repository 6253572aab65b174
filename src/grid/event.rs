//! Typed caregiving events, the input to bucketization.

use chrono::NaiveDateTime;

use crate::grid::channel::Channel;

/// Kind of a caregiving event, already normalized to a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Interval event; requires an end.
    Sleep,
    /// Point event.
    Feed,
    /// Point event for a canonical medication name.
    Med(String),
}

/// A typed, read-only input event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// When it started.
    pub start: NaiveDateTime,
    /// End of a sleep interval. Ignored for point events.
    pub end: Option<NaiveDateTime>,
}

impl Event {
    /// Sleep interval `[start, end)`.
    pub fn sleep(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            kind: EventKind::Sleep,
            start,
            end: Some(end),
        }
    }

    /// Feeding at `at`.
    pub fn feed(at: NaiveDateTime) -> Self {
        Self {
            kind: EventKind::Feed,
            start: at,
            end: None,
        }
    }

    /// Dose of canonical medication `name` at `at`.
    pub fn med(name: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            kind: EventKind::Med(name.into()),
            start: at,
            end: None,
        }
    }

    /// Channel this event paints.
    pub fn channel(&self) -> Channel {
        match &self.kind {
            EventKind::Sleep => Channel::Asleep,
            EventKind::Feed => Channel::Feed,
            EventKind::Med(name) => Channel::Med(name.clone()),
        }
    }

    /// Whether this event belongs on `channel`.
    pub fn is_on(&self, channel: &Channel) -> bool {
        match (&self.kind, channel) {
            (EventKind::Sleep, Channel::Asleep) | (EventKind::Feed, Channel::Feed) => true,
            (EventKind::Med(a), Channel::Med(b)) => a == b,
            _ => false,
        }
    }

    /// Latest timestamp that determines the grid's extent: the end of a sleep, the start of a
    /// point event.
    pub fn extent_end(&self) -> NaiveDateTime {
        match (&self.kind, self.end) {
            (EventKind::Sleep, Some(end)) => end,
            _ => self.start,
        }
    }
}

//! Calendar events: openings and appointments.
//!
//! An [`Event`] is an accepted, immutable occurrence. A [`NewEvent`] is a
//! creation request that has not been through [`crate::validation`] yet; its
//! fields may be missing.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::slot::{Slot, SLOT_MINUTES};

/// Formats accepted by [`parse_timestamp`], tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Canonical output format for timestamps.
const TIMESTAMP_OUTPUT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a local timestamp such as `2020-01-01T09:00:00` or `2020-01-01 09:00`.
///
/// No timezone handling is done; values are wall-clock times.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| EngineError::InvalidTimestamp(s.to_string()))
}

/// The two kinds of calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A time range during which appointments may be booked.
    Opening,
    /// A booked time range that consumes opening slots.
    Appointment,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Opening => "opening",
            EventKind::Appointment => "appointment",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opening" => Ok(EventKind::Opening),
            "appointment" => Ok(EventKind::Appointment),
            other => Err(format!(
                "unknown event kind '{other}' (expected 'opening' or 'appointment')"
            )),
        }
    }
}

/// An accepted calendar event.
///
/// Constructors do not validate. Events that come from user input should be
/// built as a [`NewEvent`] and go through [`NewEvent::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    kind: EventKind,
    #[serde(with = "timestamp")]
    starts_at: NaiveDateTime,
    #[serde(with = "timestamp")]
    ends_at: NaiveDateTime,
    #[serde(default)]
    weekly_recurring: bool,
}

impl Event {
    pub fn new(
        kind: EventKind,
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
        weekly_recurring: bool,
    ) -> Self {
        Self {
            kind,
            starts_at,
            ends_at,
            weekly_recurring,
        }
    }

    /// A one-off opening.
    pub fn opening(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Self {
        Self::new(EventKind::Opening, starts_at, ends_at, false)
    }

    /// An opening that repeats on the weekday of `starts_at` every week.
    pub fn recurring_opening(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Self {
        Self::new(EventKind::Opening, starts_at, ends_at, true)
    }

    pub fn appointment(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Self {
        Self::new(EventKind::Appointment, starts_at, ends_at, false)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.starts_at
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.ends_at
    }

    pub fn weekly_recurring(&self) -> bool {
        self.weekly_recurring
    }

    pub fn is_opening(&self) -> bool {
        self.kind == EventKind::Opening
    }

    pub fn is_appointment(&self) -> bool {
        self.kind == EventKind::Appointment
    }

    /// Calendar date the event starts on.
    pub fn date(&self) -> NaiveDate {
        self.starts_at.date()
    }

    /// Start labels of every 30-minute slot in `[starts_at, ends_at)`.
    ///
    /// The span is expected to be a whole number of slots on a single day.
    /// An empty or inverted span yields no slots.
    pub fn slots(&self) -> Vec<Slot> {
        slot_starts(self.starts_at, self.ends_at)
    }

    /// Whether this opening contributes slots on `date`.
    ///
    /// Recurring openings match every date sharing their weekday; one-off
    /// openings match their own date only. Appointments never match.
    pub fn is_opening_valid_for_date(&self, date: NaiveDate) -> bool {
        if !self.is_opening() {
            return false;
        }
        if self.weekly_recurring && self.starts_at.weekday() == date.weekday() {
            return true;
        }
        self.date() == date
    }

    pub fn is_appointment_valid_for_date(&self, date: NaiveDate) -> bool {
        self.is_appointment() && self.date() == date
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {}",
            self.kind,
            self.starts_at.format("%Y-%m-%d %H:%M"),
            self.ends_at.format("%H:%M")
        )?;
        if self.weekly_recurring {
            f.write_str(" (weekly)")?;
        }
        Ok(())
    }
}

/// A request to create an event. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub kind: Option<EventKind>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub weekly_recurring: bool,
}

impl NewEvent {
    pub fn new(kind: EventKind, starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Self {
        Self {
            kind: Some(kind),
            starts_at: Some(starts_at),
            ends_at: Some(ends_at),
            weekly_recurring: false,
        }
    }

    pub fn opening(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Self {
        Self::new(EventKind::Opening, starts_at, ends_at)
    }

    pub fn appointment(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Self {
        Self::new(EventKind::Appointment, starts_at, ends_at)
    }

    pub fn weekly(mut self, weekly_recurring: bool) -> Self {
        self.weekly_recurring = weekly_recurring;
        self
    }
}

/// Slot starts from `starts_at` up to (excluding) `ends_at`.
pub(crate) fn slot_starts(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> Vec<Slot> {
    let step = Duration::minutes(SLOT_MINUTES);
    let mut slots = Vec::new();
    let mut cursor = starts_at;

    while cursor < ends_at {
        slots.push(Slot::new(cursor.time()));
        match cursor.checked_add_signed(step) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    slots
}

/// Serde adapter for [`NaiveDateTime`] using [`parse_timestamp`].
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_timestamp, TIMESTAMP_OUTPUT};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_OUTPUT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

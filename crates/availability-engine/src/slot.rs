//! Slot labels.
//!
//! A slot is the start of a 30-minute interval. It is rendered as `H:MM`
//! (24-hour clock, no leading zero on the hour), but ordering and equality are
//! always by time of day: `9:00` sorts before `14:00` even though the string
//! `"14:00"` is lexicographically smaller.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use crate::error::{EngineError, Result};

/// Length of a single bookable slot, in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Start of a 30-minute interval within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(NaiveTime);

impl Slot {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Build a slot from an hour and minute, `None` if out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl From<NaiveTime> for Slot {
    fn from(time: NaiveTime) -> Self {
        Self(time)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl FromStr for Slot {
    type Err = EngineError;

    /// Parse `H:MM` or `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidSlot(s.to_string());

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;

        Slot::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PartialEq<&str> for Slot {
    fn eq(&self, other: &&str) -> bool {
        other.parse::<Slot>().is_ok_and(|slot| slot == *self)
    }
}

/// Render a list of slots as their labels.
pub fn labels(slots: &[Slot]) -> Vec<String> {
    slots.iter().map(Slot::to_string).collect()
}

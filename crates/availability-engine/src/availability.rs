//! Free slot computation for a day and for a week.
//!
//! Both functions are pure: they read an [`EventCatalog`] supplied by the
//! caller and never reach for storage. The catalog must already hold every
//! event that can matter for the requested dates (see
//! [`crate::repository::EventRepository::events_affecting_week`]); missing
//! events are not detected and simply produce fewer or extra free slots.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::event::{Event, EventKind};
use crate::slot::Slot;

/// Number of days covered by a week query.
pub const WEEK_DAYS: u64 = 7;

/// Events grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    openings: Vec<Event>,
    appointments: Vec<Event>,
}

impl EventCatalog {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        events.into_iter().collect()
    }

    pub fn push(&mut self, event: Event) {
        match event.kind() {
            EventKind::Opening => self.openings.push(event),
            EventKind::Appointment => self.appointments.push(event),
        }
    }

    pub fn openings(&self) -> &[Event] {
        &self.openings
    }

    pub fn appointments(&self) -> &[Event] {
        &self.appointments
    }

    pub fn len(&self) -> usize {
        self.openings.len() + self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.openings.is_empty() && self.appointments.is_empty()
    }
}

impl FromIterator<Event> for EventCatalog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut catalog = EventCatalog::default();
        for event in iter {
            catalog.push(event);
        }
        catalog
    }
}

/// Free slots for seven consecutive days, keyed by date.
///
/// Serializes as `{"2020-01-01": ["9:00", ...], ...}` in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeekAvailability {
    days: BTreeMap<NaiveDate, Vec<Slot>>,
}

impl WeekAvailability {
    /// Free slots on `date`, `None` if the date is outside the week.
    pub fn get(&self, date: NaiveDate) -> Option<&[Slot]> {
        self.days.get(&date).map(Vec::as_slice)
    }

    /// First day of the week.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Slot])> {
        self.days.iter().map(|(date, slots)| (*date, slots.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total number of free slots across the week.
    pub fn total_slots(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

/// Compute the free slots of a single day.
///
/// Opening slots valid on `date` are collected into a set, so overlapping
/// openings contribute each slot once. Every slot touched by an appointment on
/// `date` is then removed, whichever opening produced it. The result is ordered
/// by time of day and is empty when nothing is free.
pub fn compute_day_availability(catalog: &EventCatalog, date: NaiveDate) -> Vec<Slot> {
    let open: BTreeSet<Slot> = catalog
        .openings()
        .iter()
        .filter(|event| event.is_opening_valid_for_date(date))
        .flat_map(Event::slots)
        .collect();

    let booked: BTreeSet<Slot> = catalog
        .appointments()
        .iter()
        .filter(|event| event.is_appointment_valid_for_date(date))
        .flat_map(Event::slots)
        .collect();

    let free: Vec<Slot> = open.difference(&booked).copied().collect();

    trace!(
        %date,
        open = open.len(),
        booked = booked.len(),
        free = free.len(),
        "computed day availability"
    );

    free
}

/// Compute free slots for `start` and the six days after it.
///
/// # Errors
///
/// Returns [`EngineError::DateOutOfRange`] if the week runs past the last
/// date chrono can represent.
pub fn compute_week_availability(
    catalog: &EventCatalog,
    start: NaiveDate,
) -> Result<WeekAvailability> {
    let mut days = BTreeMap::new();

    for offset in 0..WEEK_DAYS {
        let date = start
            .checked_add_days(Days::new(offset))
            .ok_or(EngineError::DateOutOfRange(start))?;
        days.insert(date, compute_day_availability(catalog, date));
    }

    let week = WeekAvailability { days };
    debug!(
        %start,
        events = catalog.len(),
        free_slots = week.total_slots(),
        "computed week availability"
    );

    Ok(week)
}

/// Half-open `[start 00:00, start + 7 days 00:00)` window of a week query.
///
/// # Errors
///
/// Returns [`EngineError::DateOutOfRange`] if the end of the window cannot be
/// represented.
pub fn week_window(start: NaiveDate) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let end = start
        .checked_add_days(Days::new(WEEK_DAYS))
        .ok_or(EngineError::DateOutOfRange(start))?;
    Ok((
        start.and_time(NaiveTime::MIN),
        end.and_time(NaiveTime::MIN),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn catalog_groups_by_kind_in_insertion_order() {
        let at = |s: &str| crate::event::parse_timestamp(s).unwrap();
        let catalog = EventCatalog::new([
            Event::opening(at("2020-01-02 09:00"), at("2020-01-02 09:30")),
            Event::appointment(at("2020-01-01 09:00"), at("2020-01-01 09:30")),
            Event::opening(at("2020-01-01 09:00"), at("2020-01-01 09:30")),
        ]);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.openings().len(), 2);
        assert_eq!(catalog.appointments().len(), 1);
        assert_eq!(catalog.openings()[0].date(), date("2020-01-02"));
    }

    #[test]
    fn week_window_is_seven_days_from_midnight() {
        let (start, end) = week_window(date("2020-01-06")).unwrap();
        assert_eq!(start.to_string(), "2020-01-06 00:00:00");
        assert_eq!(end.to_string(), "2020-01-13 00:00:00");
    }

    #[test]
    fn week_at_end_of_calendar_is_out_of_range() {
        let result = compute_week_availability(&EventCatalog::default(), NaiveDate::MAX);
        assert!(matches!(result, Err(EngineError::DateOutOfRange(_))));
        assert!(week_window(NaiveDate::MAX).is_err());
    }
}

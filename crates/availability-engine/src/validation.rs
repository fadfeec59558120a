//! Rules an event must satisfy before it is accepted.
//!
//! Every rule runs and every violation is recorded against the field it
//! concerns, so a caller sees all problems with a request at once. Rules that
//! compare the two timestamps only run when both are present.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::availability::{compute_day_availability, EventCatalog};
use crate::event::{slot_starts, Event, EventKind, NewEvent};
use crate::slot::{Slot, SLOT_MINUTES};

pub const BLANK: &str = "can't be blank";
pub const RECURRING_APPOINTMENT: &str = "can't be true for appointment";
pub const ENDS_BEFORE_START: &str = "can't be before starts_at";
pub const DIFFERENT_DAY: &str = "can't be on a different day";
pub const NO_AVAILABLE_SLOTS: &str = "can't create appointment for no available slots";
pub const NOT_A_SLOT: &str = "is not a 30 min slot";

/// Event field a violation is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Kind,
    StartsAt,
    EndsAt,
    WeeklyRecurring,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Kind => "kind",
            Field::StartsAt => "starts_at",
            Field::EndsAt => "ends_at",
            Field::WeeklyRecurring => "weekly_recurring",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violations collected by [`validate_event`], grouped by field.
///
/// Serializes as `{"ends_at": ["is not a 30 min slot"], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded against `field`; empty if none.
    pub fn get(&self, field: Field) -> &[String] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: Field, message: &str) -> bool {
        self.get(field).iter().any(|m| m == message)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.errors.iter().map(|(field, msgs)| (*field, msgs.as_slice()))
    }

    /// Total number of messages.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Messages prefixed with their field, e.g. `ends_at is not a 30 min slot`.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{field} {m}")))
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

/// Validate a creation request against the events already accepted.
///
/// `existing` is the catalog the appointment check computes availability
/// over. It must cover the day of the proposed event, recurring openings
/// included, and must not contain the proposed event itself.
pub fn validate_event(event: &NewEvent, existing: &EventCatalog) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    // Presence
    if event.kind.is_none() {
        errors.add(Field::Kind, BLANK);
    }
    if event.starts_at.is_none() {
        errors.add(Field::StartsAt, BLANK);
    }
    if event.ends_at.is_none() {
        errors.add(Field::EndsAt, BLANK);
    }

    let is_appointment = event.kind == Some(EventKind::Appointment);
    if is_appointment && event.weekly_recurring {
        errors.add(Field::WeeklyRecurring, RECURRING_APPOINTMENT);
    }

    let (Some(starts_at), Some(ends_at)) = (event.starts_at, event.ends_at) else {
        return errors;
    };

    if ends_at <= starts_at {
        errors.add(Field::EndsAt, ENDS_BEFORE_START);
    }
    if ends_at.date() != starts_at.date() {
        errors.add(Field::EndsAt, DIFFERENT_DAY);
    }
    if is_appointment && !slots_available(starts_at, ends_at, existing) {
        errors.add(Field::Kind, NO_AVAILABLE_SLOTS);
    }
    if !is_whole_slots(starts_at, ends_at) {
        errors.add(Field::EndsAt, NOT_A_SLOT);
    }

    errors
}

impl NewEvent {
    /// Validate this request and turn it into an [`Event`].
    ///
    /// # Errors
    ///
    /// Returns every violated rule when the request is not acceptable.
    pub fn validate(self, existing: &EventCatalog) -> Result<Event, ValidationErrors> {
        let errors = validate_event(&self, existing);
        match (self.kind, self.starts_at, self.ends_at) {
            (Some(kind), Some(starts_at), Some(ends_at)) if errors.is_valid() => {
                Ok(Event::new(kind, starts_at, ends_at, self.weekly_recurring))
            }
            _ => Err(errors),
        }
    }
}

/// Every slot of the span must be free on the span's start date.
fn slots_available(starts_at: NaiveDateTime, ends_at: NaiveDateTime, existing: &EventCatalog) -> bool {
    let free: BTreeSet<Slot> = compute_day_availability(existing, starts_at.date())
        .into_iter()
        .collect();
    slot_starts(starts_at, ends_at)
        .iter()
        .all(|slot| free.contains(slot))
}

fn is_whole_slots(starts_at: NaiveDateTime, ends_at: NaiveDateTime) -> bool {
    let slot_seconds = Duration::minutes(SLOT_MINUTES).num_seconds();
    (ends_at - starts_at).num_seconds() % slot_seconds == 0
}

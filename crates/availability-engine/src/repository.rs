//! Event query interface and service entry points.
//!
//! Storage is a collaborator: anything that can answer
//! [`EventRepository::events_affecting_week`] and store validated events can
//! back [`availabilities`] and [`create_event`]. [`InMemoryEventRepository`]
//! is the reference backend.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::availability::{compute_week_availability, week_window, EventCatalog, WeekAvailability};
use crate::error::{EngineError, Result};
use crate::event::{Event, NewEvent};
use crate::validation::{validate_event, ValidationErrors};

/// Identifier assigned to a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read and write access to stored events.
pub trait EventRepository {
    /// Every event whose occurrence can affect the week starting at `start`.
    ///
    /// That is all events with `starts_at` in `[start, start + 7 days)`, plus
    /// every weekly recurring opening whatever its own date. Results are
    /// ordered by `starts_at` ascending; ties keep insertion order.
    fn events_affecting_week(&self, start: NaiveDate) -> Result<Vec<Event>>;

    /// Store an event that has already passed validation.
    fn insert(&mut self, event: Event) -> Result<EventId>;

    /// [`Self::events_affecting_week`] grouped by kind.
    fn catalog_for_week(&self, start: NaiveDate) -> Result<EventCatalog> {
        Ok(self.events_affecting_week(start)?.into_iter().collect())
    }
}

/// Vector-backed repository with sequential ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    events: Vec<(EventId, Event)>,
    next_id: u64,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load events without validating them.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut repo = Self::new();
        for event in events {
            repo.push(event);
        }
        repo
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events
            .iter()
            .find(|(event_id, _)| *event_id == id)
            .map(|(_, event)| event)
    }

    /// Stored events in insertion order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, event)| event)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn push(&mut self, event: Event) -> EventId {
        self.next_id += 1;
        let id = EventId(self.next_id);
        self.events.push((id, event));
        id
    }
}

impl EventRepository for InMemoryEventRepository {
    fn events_affecting_week(&self, start: NaiveDate) -> Result<Vec<Event>> {
        let (window_start, window_end) = week_window(start)?;

        let mut matching: Vec<Event> = self
            .events()
            .filter(|event| {
                let in_window =
                    event.starts_at() >= window_start && event.starts_at() < window_end;
                let recurs = event.is_opening() && event.weekly_recurring();
                in_window || recurs
            })
            .cloned()
            .collect();

        // Stable sort keeps insertion order for equal start times.
        matching.sort_by_key(Event::starts_at);
        Ok(matching)
    }

    fn insert(&mut self, event: Event) -> Result<EventId> {
        Ok(self.push(event))
    }
}

/// Free slots for the seven days starting at `start`.
///
/// # Errors
///
/// Propagates repository failures and [`EngineError::DateOutOfRange`].
pub fn availabilities<R: EventRepository + ?Sized>(
    repo: &R,
    start: NaiveDate,
) -> Result<WeekAvailability> {
    let catalog = repo.catalog_for_week(start)?;
    compute_week_availability(&catalog, start)
}

/// Validate `request` against the stored events without storing it.
///
/// # Errors
///
/// Only repository failures are errors; rule violations are returned as
/// data in the [`ValidationErrors`].
pub fn check_event<R: EventRepository + ?Sized>(repo: &R, request: &NewEvent) -> Result<ValidationErrors> {
    let existing = existing_events(repo, request)?;
    Ok(validate_event(request, &existing))
}

/// Validate `request` against the stored events and store it if acceptable.
///
/// Appointments are checked against the availability of their own day,
/// computed from the events the repository returns for the week starting on
/// that day.
///
/// # Errors
///
/// Returns [`EngineError::Invalid`] with every violated rule when the request
/// is rejected, or the repository's error if reading or storing fails.
pub fn create_event<R: EventRepository + ?Sized>(repo: &mut R, request: NewEvent) -> Result<EventId> {
    let existing = existing_events(&*repo, &request)?;

    let event = match request.validate(&existing) {
        Ok(event) => event,
        Err(errors) => {
            debug!(%errors, "rejected event");
            return Err(EngineError::Invalid(errors));
        }
    };

    let id = repo.insert(event.clone())?;
    info!(%id, %event, "created event");
    Ok(id)
}

/// Events the request is validated against: the week starting on its day.
fn existing_events<R: EventRepository + ?Sized>(repo: &R, request: &NewEvent) -> Result<EventCatalog> {
    match request.starts_at {
        Some(starts_at) => repo.catalog_for_week(starts_at.date()),
        None => Ok(EventCatalog::default()),
    }
}

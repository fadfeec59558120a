//! # availability-engine
//!
//! Bookable 30-minute slots computed from calendar openings and appointments.
//!
//! Openings are time ranges during which bookings are allowed, optionally
//! recurring on the same weekday every week. Appointments consume the opening
//! slots they cover. For any start date the engine produces the free slots of
//! the following seven days, and it validates new events before they are
//! stored, including the check that an appointment only lands on open slots.
//!
//! The engine never touches storage directly. Every computation runs over an
//! explicit [`EventCatalog`], and the service entry points take an
//! [`EventRepository`] handle.
//!
//! ## Modules
//!
//! - [`event`]: `Event` value type, recurrence matching, slot decomposition
//! - [`slot`]: `Slot` labels (`"9:00"`, `"14:30"`) ordered by time of day
//! - [`availability`]: per-day and per-week free slot computation
//! - [`validation`]: rule set applied to `NewEvent` before acceptance
//! - [`repository`]: event query interface and the in-memory backend
//! - [`error`]: Error types

pub mod availability;
pub mod error;
pub mod event;
pub mod repository;
pub mod slot;
pub mod validation;

pub use availability::{
    compute_day_availability, compute_week_availability, EventCatalog, WeekAvailability,
};
pub use error::{EngineError, Result};
pub use event::{parse_timestamp, Event, EventKind, NewEvent};
pub use repository::{
    availabilities, check_event, create_event, EventId, EventRepository,
    InMemoryEventRepository,
};
pub use slot::{Slot, SLOT_MINUTES};
pub use validation::{validate_event, Field, ValidationErrors};

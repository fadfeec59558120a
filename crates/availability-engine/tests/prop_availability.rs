//! Property-based tests for slot decomposition and availability using proptest.
//!
//! These tests verify invariants that should hold for *any* well-formed
//! catalog, not just the scenarios in `availability_tests.rs`.

use availability_engine::{
    compute_day_availability, compute_week_availability, Event, EventCatalog, SLOT_MINUTES,
};
use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies: generate well-formed events
// ---------------------------------------------------------------------------

/// A date in 2020-2021.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..730).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap()
    })
}

/// A slot-aligned span within one day: (date, first slot index, slot count).
fn arb_span() -> impl Strategy<Value = (NaiveDate, u32, u32)> {
    (arb_date(), 0u32..48).prop_flat_map(|(date, first)| {
        (Just(date), Just(first), 1u32..=(48 - first))
    })
}

fn to_event_bounds(date: NaiveDate, first: u32, count: u32) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(first) * SLOT_MINUTES);
    let end = start + Duration::minutes(i64::from(count) * SLOT_MINUTES);
    (start, end)
}

fn arb_event() -> impl Strategy<Value = Event> {
    (arb_span(), 0u8..3).prop_map(|((date, first, count), kind)| {
        let (start, end) = to_event_bounds(date, first, count);
        match kind {
            0 => Event::opening(start, end),
            1 => Event::recurring_opening(start, end),
            _ => Event::appointment(start, end),
        }
    })
}

fn arb_catalog() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec(arb_event(), 0..20)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// A whole-slot span yields one slot per 30 minutes, starting at its start time.
    #[test]
    fn slots_count_and_spacing((date, first, count) in arb_span()) {
        let (start, end) = to_event_bounds(date, first, count);
        let slots = Event::opening(start, end).slots();

        prop_assert_eq!(slots.len() as i64, (end - start).num_minutes() / SLOT_MINUTES);
        prop_assert_eq!(slots[0].time(), start.time());
        for pair in slots.windows(2) {
            prop_assert_eq!(pair[1].time() - pair[0].time(), Duration::minutes(SLOT_MINUTES));
        }
    }

    /// A week always has seven contiguous days starting at the requested date.
    #[test]
    fn week_has_seven_contiguous_days(events in arb_catalog(), start in arb_date()) {
        let catalog = EventCatalog::new(events);
        let week = compute_week_availability(&catalog, start).unwrap();

        let dates: Vec<NaiveDate> = week.dates().collect();
        prop_assert_eq!(dates.len(), 7);
        for (offset, date) in dates.iter().enumerate() {
            prop_assert_eq!(*date, start.checked_add_days(Days::new(offset as u64)).unwrap());
        }
    }

    /// Day availability is strictly increasing in time (sorted, no duplicates)
    /// and computing it twice gives the same answer.
    #[test]
    fn day_is_sorted_unique_and_idempotent(events in arb_catalog(), date in arb_date()) {
        let catalog = EventCatalog::new(events);
        let first = compute_day_availability(&catalog, date);
        let second = compute_day_availability(&catalog, date);

        prop_assert_eq!(&first, &second);
        for pair in first.windows(2) {
            prop_assert!(pair[0].time() < pair[1].time());
        }
    }

    /// Every free slot comes from an opening valid that day and no appointment
    /// valid that day covers it.
    #[test]
    fn free_slots_are_open_and_unbooked(events in arb_catalog(), date in arb_date()) {
        let catalog = EventCatalog::new(events);
        let free = compute_day_availability(&catalog, date);

        for slot in &free {
            let opened = catalog
                .openings()
                .iter()
                .any(|e| e.is_opening_valid_for_date(date) && e.slots().contains(slot));
            let booked = catalog
                .appointments()
                .iter()
                .any(|e| e.is_appointment_valid_for_date(date) && e.slots().contains(slot));
            prop_assert!(opened);
            prop_assert!(!booked);
        }
    }

    /// Adding an appointment removes exactly its own slots from the day.
    #[test]
    fn appointment_removes_exactly_its_slots(
        events in arb_catalog(),
        (date, first, count) in arb_span()
    ) {
        let mut catalog = EventCatalog::new(events);
        let before = compute_day_availability(&catalog, date);

        let (start, end) = to_event_bounds(date, first, count);
        let appointment = Event::appointment(start, end);
        let booked = appointment.slots();
        catalog.push(appointment);
        let after = compute_day_availability(&catalog, date);

        let expected: Vec<_> = before.into_iter().filter(|s| !booked.contains(s)).collect();
        prop_assert_eq!(after, expected);
    }
}

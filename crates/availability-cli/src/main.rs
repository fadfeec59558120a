//! `availability` CLI: compute bookable slots from a JSON event file.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots for the week starting 2020-01-06 (events from a file)
//! availability week --start 2020-01-06 -i events.json
//!
//! # Same, events piped through stdin, result written to a file
//! cat events.json | availability week --start 2020-01-06 -o week.json
//!
//! # Free slots of a single day, one per line
//! availability day --date 2020-01-07 -i events.json
//!
//! # Slot labels covered by a span
//! availability slots --starts-at "2020-01-01 09:00" --ends-at "2020-01-01 10:30"
//!
//! # Check whether an appointment could be booked
//! availability validate -i events.json --kind appointment \
//!     --starts-at "2020-01-07 09:30" --ends-at "2020-01-07 10:00"
//!
//! # Book it and write the updated event list
//! availability create -i events.json -o events.json --kind appointment \
//!     --starts-at "2020-01-07 09:30" --ends-at "2020-01-07 10:00"
//! ```
//!
//! Logs go to stderr and honor `RUST_LOG`.

use anyhow::{Context, Result};
use availability_engine::{
    availabilities, check_event, compute_day_availability, create_event, parse_timestamp,
    EngineError, Event, EventCatalog, EventKind, InMemoryEventRepository, NewEvent,
    ValidationErrors,
};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status when a proposed event fails validation.
const EXIT_INVALID: i32 = 1;

#[derive(Parser)]
#[command(
    name = "availability",
    version,
    about = "Weekly 30-minute slot availability from openings and appointments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Free slots for seven days as a JSON object keyed by date
    Week {
        /// First day of the week (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Events file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Free slots of one day, one label per line
    Day {
        /// The day (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Events file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Slot labels covered by a time span
    Slots {
        #[arg(long, value_parser = parse_datetime)]
        starts_at: NaiveDateTime,
        #[arg(long, value_parser = parse_datetime)]
        ends_at: NaiveDateTime,
    },
    /// Check a proposed event against the existing events
    Validate(EventArgs),
    /// Validate a proposed event and write the event list including it
    Create {
        #[command(flatten)]
        event: EventArgs,
        /// Output file for the updated events (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// A proposed event. Every field is optional so missing ones are reported
/// as validation errors.
#[derive(Args)]
struct EventArgs {
    /// Existing events file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// "opening" or "appointment"
    #[arg(long)]
    kind: Option<EventKind>,
    #[arg(long, value_parser = parse_datetime)]
    starts_at: Option<NaiveDateTime>,
    #[arg(long, value_parser = parse_datetime)]
    ends_at: Option<NaiveDateTime>,
    /// Repeat the opening on the same weekday every week
    #[arg(long)]
    weekly_recurring: bool,
}

impl EventArgs {
    fn request(&self) -> NewEvent {
        NewEvent {
            kind: self.kind,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            weekly_recurring: self.weekly_recurring,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Week {
            start,
            input,
            output,
        } => {
            let repo = InMemoryEventRepository::with_events(read_events(input.as_deref())?);
            let week = availabilities(&repo, start)
                .with_context(|| format!("Failed to compute availability for week of {}", start))?;
            let mut json = serde_json::to_string_pretty(&week)?;
            json.push('\n');
            write_output(output.as_deref(), &json)?;
        }
        Commands::Day { date, input } => {
            let catalog: EventCatalog = read_events(input.as_deref())?.into_iter().collect();
            for slot in compute_day_availability(&catalog, date) {
                println!("{}", slot);
            }
        }
        Commands::Slots { starts_at, ends_at } => {
            let span = Event::opening(starts_at, ends_at);
            for slot in span.slots() {
                println!("{}", slot);
            }
        }
        Commands::Validate(args) => {
            let existing = read_events(args.input.as_deref())?;
            let repo = InMemoryEventRepository::with_events(existing);
            let errors =
                check_event(&repo, &args.request()).context("Failed to validate event")?;
            if errors.is_valid() {
                println!("valid");
            } else {
                exit_invalid(&errors)?;
            }
        }
        Commands::Create { event, output } => {
            let existing = read_events(event.input.as_deref())?;
            let mut repo = InMemoryEventRepository::with_events(existing);
            match create_event(&mut repo, event.request()) {
                Ok(id) => {
                    debug!(%id, total = repo.len(), "writing events");
                    let events: Vec<&Event> = repo.events().collect();
                    let mut json = serde_json::to_string_pretty(&events)?;
                    json.push('\n');
                    write_output(output.as_deref(), &json)?;
                }
                Err(EngineError::Invalid(errors)) => exit_invalid(&errors)?,
                Err(e) => return Err(e).context("Failed to create event"),
            }
        }
    }

    Ok(())
}

/// Print the validation errors as JSON and exit with [`EXIT_INVALID`].
fn exit_invalid(errors: &ValidationErrors) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(errors)?);
    process::exit(EXIT_INVALID);
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "availability=debug,availability_engine=debug"
    } else {
        "availability=info,availability_engine=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    parse_timestamp(s).map_err(|e| e.to_string())
}

/// Read a JSON array of events. Empty input means no events.
fn read_events(path: Option<&str>) -> Result<Vec<Event>> {
    let raw = read_input(path)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let events: Vec<Event> = serde_json::from_str(&raw).context("Failed to parse events JSON")?;
    debug!(count = events.len(), "loaded events");
    Ok(events)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

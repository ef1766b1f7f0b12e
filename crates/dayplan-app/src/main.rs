//! dayplan binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the JSON event store
//! 3. Run the requested command, printing JSON on stdout
//!
//! Logs go to stderr so the output can be piped.

mod cli;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use dayplan_core::{DayplanConfig, Event, EventRecord};
use dayplan_schedule::{PlacementFailure, Reconciliation, Schedule, ScheduleContext, Scheduler};
use dayplan_store::{EventStore, JsonFileStore};

use cli::{CliArgs, Command};

/// JSON shape printed by `reconcile`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReconcileOutput<'a> {
    schedule: Vec<&'a Event>,
    to_add: &'a [Event],
    to_remove: &'a [Event],
    unplaced: &'a [PlacementFailure],
}

impl<'a> From<&'a Reconciliation> for ReconcileOutput<'a> {
    fn from(result: &'a Reconciliation) -> Self {
        Self {
            schedule: result.schedule.iter().collect(),
            to_add: &result.to_add,
            to_remove: &result.to_remove,
            unplaced: &result.unplaced,
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Read a JSON array of event records and convert each one.
fn read_events(path: &Path, ctx: &ScheduleContext) -> Result<Vec<Event>, Box<dyn Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let records: Vec<EventRecord> = serde_json::from_str(&content)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    let mut events = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        let event = Event::from_record(record, &ctx.tz)
            .map_err(|e| format!("{} record {}: {}", path.display(), i, e))?;
        events.push(event);
    }
    Ok(events)
}

/// Every readable event in the store, in bucket order.
fn stored_schedule(store: &JsonFileStore, ctx: &ScheduleContext) -> Result<Schedule, Box<dyn Error>> {
    let buckets = store.load()?;
    let mut schedule = Schedule::new();
    for (bucket, values) in buckets.0 {
        for value in values {
            match Event::from_json(value, &ctx.tz) {
                Ok(event) => schedule.push(event),
                Err(e) => tracing::warn!(%bucket, error = %e, "Skipping malformed stored event"),
            }
        }
    }
    Ok(schedule)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply.
    let config_file = args.resolve_config_path();
    let loaded = DayplanConfig::load(&config_file);
    let config_level = loaded
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&args.resolve_log_level(&config_level));

    let config = match loaded {
        Ok(config) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) if config_file.exists() && args.command == Command::CheckConfig => {
            tracing::error!(path = %config_file.display(), error = %e, "Configuration unreadable");
            return Err(e.into());
        }
        Err(e) => {
            tracing::warn!(
                path = %config_file.display(),
                error = %e,
                "Failed to load config, using defaults"
            );
            DayplanConfig::default()
        }
    };
    config.validate()?;
    let ctx = ScheduleContext::from_config(&config.schedule)?;

    let store = JsonFileStore::new(args.resolve_store_path(&config.store.path));
    tracing::debug!(path = %store.path().display(), "Event store selected");

    match args.command {
        Command::Reconcile {
            batch,
            schedule,
            apply,
        } => {
            let new_events = read_events(&batch, &ctx)?;
            let schedule = match schedule {
                Some(path) => Schedule::from(read_events(&path, &ctx)?),
                None => stored_schedule(&store, &ctx)?,
            };
            tracing::info!(
                batch = new_events.len(),
                scheduled = schedule.len(),
                "Reconciling batch"
            );

            let scheduler = Scheduler::new(Arc::new(store.clone()), ctx);
            let result = scheduler.reconcile(new_events, schedule);

            if apply {
                store.apply(&result.to_add, &result.to_remove)?;
            }
            print_json(&ReconcileOutput::from(&result))?;
        }
        Command::Show { date } => {
            let buckets = store.load()?;
            let document = match date {
                Some(date) => {
                    let values = buckets
                        .select(date..=date)
                        .into_iter()
                        .map(|record| record.value)
                        .collect();
                    let mut day = serde_json::Map::new();
                    day.insert(date.to_string(), serde_json::Value::Array(values));
                    serde_json::Value::Object(day)
                }
                None => buckets.to_document(),
            };
            print_json(&document)?;
        }
        Command::CheckConfig => {
            tracing::info!(path = %config_file.display(), "Configuration valid");
            print_json(&config)?;
        }
    }

    Ok(())
}

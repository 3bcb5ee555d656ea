//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `schedule_core` linkage without the app shell.
//! - Exercise one add/complete cycle against a throwaway directory.

use schedule_core::{init_logging, LoggingConfig, NewSchedule, ScheduleService, StorageLayout};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("schedule_core version={}", schedule_core::core_version());

    let scratch = tempfile::tempdir()?;
    init_logging(&LoggingConfig::with_default_level(scratch.path().join("logs"))?)?;

    let layout = StorageLayout::new(scratch.path().join("data"))?;
    let mut service = ScheduleService::open(&layout)?;
    service.add_schedule(&NewSchedule {
        title: "smoke check".to_string(),
        ..NewSchedule::default()
    })?;
    let completed = service.complete_schedule(0)?;
    log::info!("event=cli_smoke module=cli status=ok");

    println!(
        "smoke pending={} completed={} last_completed_id={}",
        service.pending().len(),
        service.completed()?.len(),
        completed.id
    );
    Ok(())
}

//! `dropwatch state` — inspect or clear persisted snapshots.

use crate::cli::output;
use crate::config::Config;
use crate::store::SnapshotStore;
use anyhow::Result;
use chrono::NaiveDate;

/// List all persisted page records.
pub fn run_list() -> Result<()> {
    let cfg = Config::from_env()?;
    let store = SnapshotStore::open(&cfg.state_dir)?;
    let records = store.list()?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        output::say("No persisted state.");
        return Ok(());
    }
    for record in records {
        let items = if record.items.is_empty() {
            String::from("-")
        } else {
            record.items.join(", ")
        };
        output::say(format!(
            "{}  available={}  items: {}  (checked {})",
            record.date, record.available, items, record.checked_at
        ));
    }
    Ok(())
}

/// Clear persisted records, optionally for one date only.
pub fn run_clear(date: Option<NaiveDate>) -> Result<()> {
    let cfg = Config::from_env()?;
    let store = SnapshotStore::open(&cfg.state_dir)?;
    let removed = store.clear(date)?;
    output::say(format!("Removed {removed} record(s)."));
    Ok(())
}

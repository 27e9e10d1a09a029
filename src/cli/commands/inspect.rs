//! Inspect command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::InspectArgs;
use crate::stats::StatisticsStore;

pub fn run_inspect(args: InspectArgs, level: LogLevel) -> Result<(), String> {
    let store = StatisticsStore::load(&args.snapshot).map_err(|e| {
        format!(
            "Failed to load snapshot {}: {e}",
            args.snapshot.display()
        )
    })?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Snapshot: {} ({} layers)",
            args.snapshot.display(),
            store.layer_count()
        ),
    );
    log(level, LogLevel::Normal, store.summary().to_string().trim_end());

    Ok(())
}

use std::time::{Duration, Instant};

use marketmap_core::{MarketEngine, RecordOptions};

use crate::cli::WatchArgs;
use crate::error::CliError;

use super::records::records_result;
use super::CommandResult;

/// Runs `records` over the whole catalog once per interval, handing each pass to `emit`.
pub async fn run<F>(args: &WatchArgs, engine: &MarketEngine, mut emit: F) -> Result<(), CliError>
where
    F: FnMut(CommandResult) -> Result<(), CliError>,
{
    if args.interval_secs == 0 {
        return Err(CliError::Command(String::from(
            "--interval-secs must be at least 1",
        )));
    }

    let interval = Duration::from_secs(args.interval_secs);
    let options = RecordOptions {
        include_eur: args.eur,
        ..RecordOptions::default()
    };

    let mut pass = 0_u64;
    loop {
        if args.refresh && pass > 0 {
            engine.refresh().await;
        }

        let started = Instant::now();
        let records = engine.get_all_records(options).await;
        tracing::info!(pass, markets = records.len(), "watch pass complete");
        emit(records_result(&records)?.with_elapsed(started.elapsed()))?;

        pass += 1;
        if args.count.is_some_and(|count| pass >= count) {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

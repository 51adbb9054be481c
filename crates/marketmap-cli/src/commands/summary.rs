use std::time::Instant;

use marketmap_core::{MarketEngine, MarketSummary, RecordOptions};

use crate::cli::SummaryArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{format_optional, to_region, CommandResult};

pub async fn run(args: &SummaryArgs, engine: &MarketEngine) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let records = match args.region {
        Some(region) => {
            engine
                .get_region_records(to_region(region), RecordOptions::default())
                .await
        }
        None => engine.get_all_records(RecordOptions::default()).await,
    };

    let summary = engine.summarize(&records);
    let data = serde_json::to_value(&summary)?;

    Ok(CommandResult::ok(data, summary_table(&summary))
        .with_provenance_of(&records)
        .with_elapsed(started.elapsed()))
}

fn summary_table(summary: &MarketSummary) -> Table {
    let mut table = Table::new(vec!["metric", "value"]);
    let performer = |performer: &Option<marketmap_core::Performer>| {
        performer
            .as_ref()
            .map(|p| format!("{} ({:+.2}%)", p.display_name, p.change_pct))
            .unwrap_or_else(|| String::from("-"))
    };

    let rows = [
        ("markets", summary.total_markets.to_string()),
        ("up", summary.markets_up.to_string()),
        ("down", summary.markets_down.to_string()),
        ("open", summary.markets_open.to_string()),
        ("simulated", summary.simulated_markets.to_string()),
        ("average change", format_optional(summary.average_change_pct, "%")),
        ("best", performer(&summary.best_performer)),
        ("worst", performer(&summary.worst_performer)),
    ];
    for (metric, value) in rows {
        table.push_row(vec![metric.to_owned(), value]);
    }

    table
}

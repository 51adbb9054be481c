use std::time::Instant;

use marketmap_core::{MarketEngine, MarketRecord, RecordOptions, Symbol};

use crate::cli::RecordsArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{format_optional, to_region, CommandResult};

pub async fn run(args: &RecordsArgs, engine: &MarketEngine) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let options = RecordOptions {
        include_eur: args.eur,
        ..RecordOptions::default()
    };

    let records = if !args.symbols.is_empty() {
        let symbols = args
            .symbols
            .iter()
            .map(|raw| Symbol::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        engine.get_records(&symbols, options).await?
    } else if let Some(region) = args.region {
        engine.get_region_records(to_region(region), options).await
    } else {
        engine.get_all_records(options).await
    };

    records_result(&records).map(|result| result.with_elapsed(started.elapsed()))
}

pub(super) fn records_result(records: &[MarketRecord]) -> Result<CommandResult, CliError> {
    let data = serde_json::to_value(records)?;
    Ok(CommandResult::ok(data, records_table(records)).with_provenance_of(records))
}

fn records_table(records: &[MarketRecord]) -> Table {
    let mut table = Table::new(vec![
        "symbol",
        "market",
        "price",
        "change",
        "trend",
        "vol range",
        "session",
        "local",
        "eur",
        "weather",
        "provenance",
    ]);

    for record in records {
        table.push_row(vec![
            record.symbol.to_string(),
            record.display_name.clone(),
            format!("{:.2} {}", record.price, record.currency_code),
            format_optional(record.change_pct, "%"),
            record.trend.as_str().to_owned(),
            format_optional(record.volatility_range_pct, "%"),
            record.session_state.as_str().to_owned(),
            record.local_time.clone(),
            format_optional(record.eur_price, " EUR"),
            format!(
                "{} {}",
                record.classification_label.emoji(),
                record.classification_label
            ),
            record.provenance.to_string(),
        ]);
    }

    table
}

use marketmap_core::{MarketDefinition, MarketEngine};

use crate::cli::CatalogArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{to_region, CommandResult};

pub fn run(args: &CatalogArgs, engine: &MarketEngine) -> Result<CommandResult, CliError> {
    let region = args.region.map(to_region);
    let markets = engine
        .catalog()
        .iter()
        .filter(|market| region.map_or(true, |region| market.region == region))
        .collect::<Vec<&MarketDefinition>>();

    let mut table = Table::new(vec![
        "symbol", "fallback", "market", "country", "region", "currency", "timezone", "hours",
    ]);
    for market in &markets {
        table.push_row(vec![
            market.symbol.to_string(),
            market
                .fallback_symbol
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| String::from("-")),
            market.display_name.clone(),
            market.country.clone(),
            market.region.to_string(),
            market.currency_code.clone(),
            market.timezone_id.clone(),
            format!(
                "{:02}:00-{:02}:00",
                market.session_open_hour, market.session_close_hour
            ),
        ]);
    }

    let data = serde_json::to_value(&markets)?;
    Ok(CommandResult::ok(data, table))
}

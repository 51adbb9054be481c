mod catalog;
mod records;
mod sessions;
mod summary;
mod watch;

use std::time::Duration;

use marketmap_core::{EngineConfig, MarketCatalog, MarketEngine, MarketRecord, Region};
use serde_json::Value;

use crate::cli::{Cli, Command, RegionArg};
use crate::error::CliError;
use crate::output::{self, Table};

pub struct CommandResult {
    pub data: Value,
    pub table: Table,
    pub warnings: Vec<String>,
    pub simulated: usize,
    pub total: usize,
    pub elapsed_ms: u64,
}

impl CommandResult {
    pub fn ok(data: Value, table: Table) -> Self {
        Self {
            data,
            table,
            warnings: Vec::new(),
            simulated: 0,
            total: 0,
            elapsed_ms: 0,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Counts simulated records and adds a warning when there are any.
    pub fn with_provenance_of(mut self, records: &[MarketRecord]) -> Self {
        self.total = records.len();
        self.simulated = records
            .iter()
            .filter(|record| !record.provenance.is_real())
            .count();
        if self.simulated > 0 {
            let warning = format!(
                "{} of {} records are simulated",
                self.simulated, self.total
            );
            self = self.with_warning(warning);
        }
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis().min(u128::from(u64::MAX)) as u64;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let engine = build_engine(cli)?;

    match &cli.command {
        Command::Records(args) => emit(cli, records::run(args, &engine).await?),
        Command::Summary(args) => emit(cli, summary::run(args, &engine).await?),
        Command::Sessions(args) => emit(cli, sessions::run(args, &engine)?),
        Command::Catalog(args) => emit(cli, catalog::run(args, &engine)?),
        Command::Watch(args) => watch::run(args, &engine, |result| emit(cli, result)).await,
    }
}

fn build_engine(cli: &Cli) -> Result<MarketEngine, CliError> {
    let mut config = EngineConfig::from_env()?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config.upstream.timeout = Duration::from_millis(timeout_ms);
    }

    let catalog = match &cli.catalog {
        Some(path) => MarketCatalog::load(path)?,
        None => MarketCatalog::world_indices(),
    };

    let mut builder = MarketEngine::builder()
        .with_config(config)
        .with_catalog(catalog);
    if cli.offline {
        builder = builder.with_offline_mode();
    }

    Ok(builder.build()?)
}

fn emit(cli: &Cli, result: CommandResult) -> Result<(), CliError> {
    output::render(&result, cli.format, cli.pretty)?;

    if cli.strict && result.simulated > 0 {
        return Err(CliError::StrictModeViolation {
            simulated: result.simulated,
            total: result.total,
        });
    }

    Ok(())
}

pub(crate) fn to_region(region: RegionArg) -> Region {
    match region {
        RegionArg::NorthAmerica => Region::NorthAmerica,
        RegionArg::Europe => Region::Europe,
        RegionArg::AsiaPacific => Region::AsiaPacific,
        RegionArg::LatinAmerica => Region::LatinAmerica,
    }
}

pub(crate) fn format_optional(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|value| format!("{value:.2}{suffix}"))
        .unwrap_or_else(|| String::from("-"))
}

//! CLI argument definitions for marketmap.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `records` | Normalized records for some or all markets |
//! | `summary` | Aggregate KPIs over the records |
//! | `sessions` | Trading-session status per market (no network) |
//! | `catalog` | List the market catalog |
//! | `watch` | Repeat `records` on an interval |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Fail when any record is simulated |
//! | `--offline` | `false` | Never touch the network |
//! | `--catalog` | bundled | JSON catalog file |
//! | `--timeout-ms` | config | Per-request timeout |
//!
//! # Examples
//!
//! ```bash
//! marketmap records ^GSPC ^FTSE --eur --format table
//! marketmap summary --region europe
//! marketmap sessions --format table
//! marketmap watch --interval-secs 60 --count 5 --refresh
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// 🗺️ marketmap - world stock index snapshot
///
/// Fetches quotes for a catalog of world indices, derives trend and volatility, classifies
/// trading sessions and prints one normalized record per market.
#[derive(Debug, Parser)]
#[command(
    name = "marketmap",
    author,
    version,
    about = "World stock index snapshot",
    long_about = "marketmap collects quotes for a catalog of world stock indices and prints one \
normalized record per market. Features include:\n\
\n\
  • Primary, fallback and synthetic data tiers with provenance tags\n\
  • Moving average, trend and volatility range indicators\n\
  • Timezone-aware trading session status\n\
  • Optional EUR conversion\n\
\n\
Engine parameters can be overridden with MARKETMAP_* environment variables.\n\
Use 'marketmap <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Exit with code 5 when any record carries simulated data.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Serve every market from the synthetic tier without network access.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// JSON catalog file replacing the bundled world indices.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON object.
    Json,
    /// One JSON object per line.
    Ndjson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegionArg {
    NorthAmerica,
    Europe,
    AsiaPacific,
    LatinAmerica,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 📈 Normalized records for the given symbols, or the whole catalog.
    ///
    /// # Examples
    ///
    ///   marketmap records
    ///   marketmap records ^GSPC ^N225 --eur
    ///   marketmap records --region asia-pacific --format table
    Records(RecordsArgs),

    /// 📊 Markets up/down, average change, best and worst performer.
    Summary(SummaryArgs),

    /// 🕐 Trading-session status for every market. No network access.
    Sessions(SessionsArgs),

    /// 📋 List the market catalog.
    Catalog(CatalogArgs),

    /// 🔁 Print records repeatedly.
    ///
    /// # Examples
    ///
    ///   marketmap watch --interval-secs 30 --count 10 --refresh
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct RecordsArgs {
    /// Market symbols (e.g. ^GSPC, ^FTSE). Defaults to the whole catalog.
    pub symbols: Vec<String>,

    /// Only markets in this region.
    #[arg(long, value_enum, conflicts_with = "symbols")]
    pub region: Option<RegionArg>,

    /// Include the price converted to EUR.
    #[arg(long, default_value_t = false)]
    pub eur: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Only markets in this region.
    #[arg(long, value_enum)]
    pub region: Option<RegionArg>,
}

#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Evaluate at this RFC3339 UTC instant instead of now.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Only markets in this region.
    #[arg(long, value_enum)]
    pub region: Option<RegionArg>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between passes.
    #[arg(long, default_value_t = 60)]
    pub interval_secs: u64,

    /// Number of passes. Runs until interrupted when omitted.
    #[arg(long)]
    pub count: Option<u64>,

    /// Clear the cache before every pass.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,

    /// Include the price converted to EUR.
    #[arg(long, default_value_t = false)]
    pub eur: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_records_with_global_flags() {
        let cli = Cli::try_parse_from([
            "marketmap",
            "records",
            "^GSPC",
            "^FTSE",
            "--eur",
            "--offline",
            "--format",
            "table",
        ])
        .expect("valid arguments");

        assert!(cli.offline);
        assert_eq!(cli.format, OutputFormat::Table);
        match cli.command {
            Command::Records(args) => {
                assert_eq!(args.symbols, vec!["^GSPC", "^FTSE"]);
                assert!(args.eur);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn region_accepts_kebab_case() {
        let cli = Cli::try_parse_from(["marketmap", "summary", "--region", "asia-pacific"])
            .expect("valid arguments");

        match cli.command {
            Command::Summary(args) => assert_eq!(args.region, Some(RegionArg::AsiaPacific)),
            other => panic!("unexpected command {other:?}"),
        }
    }
}

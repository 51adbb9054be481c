use serde::{Deserialize, Serialize};

use crate::domain::MarketRecord;
use crate::Symbol;

/// One market's change, used for best/worst performer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub symbol: Symbol,
    pub display_name: String,
    pub change_pct: f64,
}

/// Aggregate KPIs over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub total_markets: usize,
    pub markets_up: usize,
    pub markets_down: usize,
    pub markets_open: usize,
    pub simulated_markets: usize,
    pub average_change_pct: Option<f64>,
    pub best_performer: Option<Performer>,
    pub worst_performer: Option<Performer>,
}

/// Records without a `change_pct` count toward the total but not toward any change KPI.
pub fn summarize(records: &[MarketRecord]) -> MarketSummary {
    let changes: Vec<(&MarketRecord, f64)> = records
        .iter()
        .filter_map(|record| record.change_pct.map(|change| (record, change)))
        .collect();

    let average_change_pct = if changes.is_empty() {
        None
    } else {
        let total: f64 = changes.iter().map(|(_, change)| change).sum();
        Some(crate::indicators::round2(total / changes.len() as f64))
    };

    let performer = |(record, change): &(&MarketRecord, f64)| Performer {
        symbol: record.symbol.clone(),
        display_name: record.display_name.clone(),
        change_pct: *change,
    };

    MarketSummary {
        total_markets: records.len(),
        markets_up: changes.iter().filter(|(_, change)| *change > 0.0).count(),
        markets_down: changes.iter().filter(|(_, change)| *change < 0.0).count(),
        markets_open: records
            .iter()
            .filter(|record| record.session_state.is_open())
            .count(),
        simulated_markets: records
            .iter()
            .filter(|record| !record.provenance.is_real())
            .count(),
        average_change_pct,
        best_performer: changes
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(performer),
        worst_performer: changes
            .iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(performer),
    }
}

use serde::Serialize;

use marketmap_core::{MarketEngine, SessionState, Symbol, UtcDateTime};

use crate::cli::SessionsArgs;
use crate::error::CliError;
use crate::output::Table;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct MarketSession<'a> {
    symbol: &'a Symbol,
    display_name: &'a str,
    timezone_id: &'a str,
    state: SessionState,
    local_time: String,
    next_transition_hint: String,
}

pub fn run(args: &SessionsArgs, engine: &MarketEngine) -> Result<CommandResult, CliError> {
    let now = match &args.at {
        Some(raw) => UtcDateTime::parse(raw)?,
        None => UtcDateTime::now(),
    };

    let sessions = engine
        .sessions(now)
        .into_iter()
        .map(|(market, status)| MarketSession {
            symbol: &market.symbol,
            display_name: &market.display_name,
            timezone_id: &market.timezone_id,
            state: status.state,
            local_time: status.local_time,
            next_transition_hint: status.next_transition_hint,
        })
        .collect::<Vec<_>>();

    let mut table = Table::new(vec!["symbol", "market", "timezone", "session", "local", "next"]);
    for session in &sessions {
        table.push_row(vec![
            session.symbol.to_string(),
            session.display_name.to_owned(),
            session.timezone_id.to_owned(),
            session.state.as_str().to_owned(),
            session.local_time.clone(),
            session.next_transition_hint.clone(),
        ]);
    }

    let data = serde_json::to_value(&sessions)?;
    Ok(CommandResult::ok(data, table))
}

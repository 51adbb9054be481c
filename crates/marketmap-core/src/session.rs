//! Trading-session classification from a market's timezone and whole-hour session bounds.
//!
//! Nothing is persisted between calls: every call re-derives the state from `now`.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::domain::{MarketDefinition, SessionState, SessionStatus};
use crate::UtcDateTime;

/// Classifies `now` against `open_hour..close_hour` in `timezone_id`.
///
/// Rules, first match wins: unknown zone is `Error`, Saturday or Sunday is `ClosedWeekend`,
/// `open <= hour < close` is `Open`, `hour < open` is `PreMarket`, anything else is
/// `PostMarket`. Minutes never take part in the comparison.
pub fn status(
    timezone_id: &str,
    open_hour: u32,
    close_hour: u32,
    now: UtcDateTime,
) -> SessionStatus {
    let tz: Tz = match timezone_id.parse() {
        Ok(tz) => tz,
        Err(e) => {
            tracing::warn!(timezone = timezone_id, error = %e, "unknown timezone");
            return SessionStatus {
                state: SessionState::Error,
                local_time: String::from("unknown"),
                next_transition_hint: String::from("timezone unavailable"),
            };
        }
    };

    classify_local(now.to_chrono(), tz, open_hour, close_hour)
}

/// Session status for a catalog entry.
pub fn market_status(market: &MarketDefinition, now: UtcDateTime) -> SessionStatus {
    status(
        &market.timezone_id,
        market.session_open_hour,
        market.session_close_hour,
        now,
    )
}

fn classify_local(now: DateTime<Utc>, tz: Tz, open_hour: u32, close_hour: u32) -> SessionStatus {
    let local = now.with_timezone(&tz);
    let hour = local.hour();
    let local_time = format!("{:02}:{:02}", hour, local.minute());

    let (state, next_transition_hint) = match local.weekday() {
        Weekday::Sat | Weekday::Sun => (
            SessionState::ClosedWeekend,
            format!("opens Monday at {open_hour:02}:00"),
        ),
        weekday => {
            if open_hour <= hour && hour < close_hour {
                (SessionState::Open, format!("closes at {close_hour:02}:00"))
            } else if hour < open_hour {
                (SessionState::PreMarket, format!("opens at {open_hour:02}:00"))
            } else if weekday == Weekday::Fri {
                (
                    SessionState::PostMarket,
                    format!("opens Monday at {open_hour:02}:00"),
                )
            } else {
                (
                    SessionState::PostMarket,
                    format!("opens tomorrow at {open_hour:02}:00"),
                )
            }
        }
    };

    SessionStatus {
        state,
        local_time,
        next_transition_hint,
    }
}

// src/export/range.rs

use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};

fn invalid(what: &str, raw: &str) -> AppError {
    AppError::InvalidDate(format!("{what} in --range: '{raw}'"))
}

/// Primo e ultimo giorno di un periodo `YYYY`, `YYYY-MM` o `YYYY-MM-DD`.
fn period_bounds(raw: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    match raw.len() {
        // YYYY
        4 => {
            let y: i32 = raw.parse().map_err(|_| invalid("invalid year", raw))?;
            let first = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(|| invalid("invalid year", raw))?;
            let last = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(|| invalid("invalid year", raw))?;
            Ok((first, last))
        }
        // YYYY-MM
        7 => {
            let first = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
                .map_err(|_| invalid("invalid month", raw))?;
            let next = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            };
            let last = next
                .and_then(|d| d.pred_opt())
                .ok_or_else(|| invalid("invalid month", raw))?;
            Ok((first, last))
        }
        // YYYY-MM-DD
        10 => {
            let d = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| invalid("invalid date", raw))?;
            Ok((d, d))
        }
        _ => Err(invalid("unsupported format", raw)),
    }
}

/// Parse --range (anno / mese / giorno / intervallo), estremi inclusi.
///
/// Supporta:
/// - YYYY
/// - YYYY-MM
/// - YYYY-MM-DD
/// - YYYY:YYYY
/// - YYYY-MM:YYYY-MM
/// - YYYY-MM-DD:YYYY-MM-DD
pub(crate) fn parse_range(r: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let Some((start_raw, end_raw)) = r.split_once(':') else {
        return period_bounds(r.trim());
    };

    let (start, end) = (start_raw.trim(), end_raw.trim());
    if start.len() != end.len() {
        return Err(invalid("start and end must have the same format", r));
    }

    let (from, _) = period_bounds(start)?;
    let (_, to) = period_bounds(end)?;
    if from > to {
        return Err(invalid("start after end", r));
    }
    Ok((from, to))
}

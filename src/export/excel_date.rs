// src/export/excel_date.rs

use crate::export::model::EXPORT_DT_FMT;
use chrono::{NaiveDate, NaiveDateTime};

/// Formato numerico Excel per le date di export.
pub(crate) const EXCEL_DT_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Seriale Excel (giorni dal 1899-12-30, frazione = ora) di una data
/// formattata come negli export. `None` per "-" o testo qualsiasi.
pub(crate) fn excel_serial(s: &str) -> Option<f64> {
    let dt = NaiveDateTime::parse_from_str(s.trim(), EXPORT_DT_FMT).ok()?;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;

    let secs = (dt - epoch).num_seconds() as f64;
    Some(secs / 86_400.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_becomes_serial() {
        let serial = excel_serial("2025-01-01 12:00:00").unwrap();
        assert!((serial - 45658.5).abs() < 1e-9);
    }

    #[test]
    fn placeholders_and_other_formats_are_not_dates() {
        assert!(excel_serial("-").is_none());
        assert!(excel_serial("TB1").is_none());
        assert!(excel_serial("2025-01-01").is_none());
    }
}

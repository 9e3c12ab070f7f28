//! Elapsed-time arithmetic shared by the counter, the CLI and the exports.

/// Downtime in whole minutes, always rounded up: 61 s → 2 min.
pub fn downtime_minutes(elapsed_secs: u64) -> u32 {
    u32::try_from(elapsed_secs.div_ceil(60)).unwrap_or(u32::MAX)
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Average of the given downtimes, rounded to the nearest minute.
pub fn average_minutes<I: IntoIterator<Item = u32>>(values: I) -> Option<u32> {
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(s, c), v| (s + u64::from(v), c + 1));

    if count == 0 {
        None
    } else {
        Some(((sum as f64) / (count as f64)).round() as u32)
    }
}

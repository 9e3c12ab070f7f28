//! Formatting utilities used for CLI outputs.

use unicode_width::UnicodeWidthStr;

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

/// Pad to `width` terminal columns (accents and emoji count correctly).
pub fn pad_right(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// es: 125 → "02h 05m", 45 → "45 min"
pub fn mins2readable(mins: u32) -> String {
    if mins < 60 {
        return format!("{mins} min");
    }
    format!("{:02}h {:02}m", mins / 60, mins % 60)
}

/// `Some(45)` → "45 min", `None` → "-"
pub fn optional_minutes(mins: Option<u32>) -> String {
    mins.map(|m| format!("{m} min"))
        .unwrap_or_else(|| "-".to_string())
}

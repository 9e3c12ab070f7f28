/// ANSI color helper utilities for terminal output.
use crate::schedule::Urgency;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";

/// Countdown color: the closer the change, the louder.
pub fn color_for_urgency(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Scheduled => BLUE,
        Urgency::Soon => YELLOW,
        Urgency::Imminent | Urgency::Expired => RED,
    }
}

/// Green while on target, red once exceeded.
pub fn color_for_target(exceeded: bool) -> &'static str {
    if exceeded { RED } else { GREEN }
}

/// Ritorna formattazione colorata di un valore opzionale.
///
/// Esempio:
/// `colorize_optional("-")` → "<grey>-<reset>"
pub fn colorize_optional(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() || v == "-" || v == "0 min" {
        format!("{GREY}{value}{RESET}")
    } else {
        value.to_string()
    }
}

pub fn paint(color: &str, value: &str) -> String {
    format!("{color}{value}{RESET}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_greyed() {
        assert_eq!(colorize_optional("-"), format!("{GREY}-{RESET}"));
        assert_eq!(colorize_optional("Falla mecánica"), "Falla mecánica");
    }
}

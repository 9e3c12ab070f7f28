use chrono::{DateTime, TimeZone, Timelike};

/// Work shifts, derived from the wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    First,  // < 14:00
    Second, // < 22:00
    Third,
}

impl Shift {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 14 {
            Shift::First
        } else if hour < 22 {
            Shift::Second
        } else {
            Shift::Third
        }
    }

    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Shift::from_hour(now.hour())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Shift::First => "Primer turno",
            Shift::Second => "Segundo turno",
            Shift::Third => "Tercer turno",
        }
    }
}

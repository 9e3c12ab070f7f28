use super::downtime::format_hms;

/// Default target for a mold change: 45 minutes.
pub const DEFAULT_TARGET_SECS: u64 = 45 * 60;

/// The time budget a change is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    secs: u64,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            secs: DEFAULT_TARGET_SECS,
        }
    }
}

impl Target {
    pub fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self { secs: minutes * 60 }
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }

    pub fn minutes(&self) -> u64 {
        self.secs / 60
    }

    /// Strictly over: exactly on target still counts as on target.
    pub fn is_exceeded(&self, elapsed_secs: u64) -> bool {
        elapsed_secs > self.secs
    }

    /// True only for the first second past the target.
    pub fn just_exceeded(&self, elapsed_secs: u64) -> bool {
        elapsed_secs == self.secs + 1
    }

    /// Composite observation stored in `notes` when a change is completed.
    pub fn observation(&self, elapsed_secs: u64, delay_reason: Option<&str>) -> String {
        let timing = format!(
            "Tiempo: {} (Meta: {} min)",
            format_hms(elapsed_secs),
            self.minutes()
        );

        if self.is_exceeded(elapsed_secs) {
            format!(
                "FUERA DE META | Motivo Retraso: {} | {}",
                delay_reason.unwrap_or("-"),
                timing
            )
        } else {
            format!("EN META | {}", timing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_on_target() {
        let t = Target::default();
        assert!(!t.is_exceeded(2700));
        assert!(t.is_exceeded(2701));
        assert!(t.just_exceeded(2701));
        assert!(!t.just_exceeded(2702));
    }

    #[test]
    fn observation_strings() {
        let t = Target::default();
        assert_eq!(
            t.observation(1800, None),
            "EN META | Tiempo: 00:30:00 (Meta: 45 min)"
        );
        assert_eq!(
            t.observation(2760, Some("Falla mecánica")),
            "FUERA DE META | Motivo Retraso: Falla mecánica | Tiempo: 00:46:00 (Meta: 45 min)"
        );
    }
}

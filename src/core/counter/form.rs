use super::CounterError;
use crate::models::line::Line;
use crate::models::mold_change::{DELAY_REASONS, MoldChange, OTHER_REASON};

/// What the operator fills in before and during a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeForm {
    pub line: Option<Line>,
    pub supervisor: String,
    pub previous_mold: String,
    pub new_mold: String,
    pub reason: String,
    pub delay_reason: String,
    /// Free text, required when `delay_reason` is "Otro".
    pub delay_description: String,
}

impl ChangeForm {
    /// Required fields left blank, in display order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.line.is_none() {
            missing.push("line");
        }
        if self.supervisor.trim().is_empty() {
            missing.push("supervisor");
        }
        if self.previous_mold.trim().is_empty() {
            missing.push("previous mold");
        }
        if self.new_mold.trim().is_empty() {
            missing.push("new mold");
        }
        if self.reason.trim().is_empty() {
            missing.push("reason");
        }
        missing
    }

    /// Validate the required fields and hand back the selected line.
    pub fn validate(&self) -> Result<Line, CounterError> {
        let missing = self.missing_fields();
        match self.line {
            Some(line) if missing.is_empty() => Ok(line),
            _ => Err(CounterError::MissingFields(missing)),
        }
    }

    /// Check the delay fields required once the target is exceeded.
    pub fn validate_delay(&self) -> Result<(), CounterError> {
        if self.delay_reason.trim().is_empty() {
            return Err(CounterError::DelayReasonRequired);
        }
        if self.delay_reason.trim() == OTHER_REASON && self.delay_description.trim().is_empty() {
            return Err(CounterError::DelayDescriptionRequired);
        }
        Ok(())
    }

    /// Value persisted as `delayReason`: the description when "Otro".
    pub fn stored_delay_reason(&self) -> Option<String> {
        let reason = self.delay_reason.trim();
        if reason.is_empty() {
            None
        } else if reason == OTHER_REASON {
            Some(self.delay_description.trim().to_string())
        } else {
            Some(reason.to_string())
        }
    }

    /// Copy the descriptive fields of a record found in the store.
    pub fn from_record(rec: &MoldChange) -> Self {
        let (delay_reason, delay_description) = match rec.delay_reason.as_deref() {
            None | Some("") => (String::new(), String::new()),
            Some(r) if DELAY_REASONS.contains(&r) => (r.to_string(), String::new()),
            Some(other) => (OTHER_REASON.to_string(), other.to_string()),
        };

        Self {
            line: Some(rec.line),
            supervisor: rec.supervisor_name.clone(),
            previous_mold: rec.previous_mold_id.clone(),
            new_mold: rec.new_mold_id.clone(),
            reason: rec.reason_code.clone(),
            delay_reason,
            delay_description,
        }
    }
}

//! Closing an open mold change by id.

use crate::core::calculator::downtime::downtime_minutes;
use crate::core::calculator::target::Target;
use crate::core::counter::{ChangeForm, CounterError};
use crate::errors::{AppError, AppResult};
use crate::models::mold_change::{MoldChange, MoldChangePatch};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Default)]
pub struct CompleteRequest {
    /// Downtime to record instead of the time since `startedAt`.
    pub minutes: Option<u32>,
    pub delay_reason: Option<String>,
    /// Required with delay reason "Otro".
    pub description: Option<String>,
}

/// Completion patch plus the target verdict reported to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletePlan {
    pub patch: MoldChangePatch,
    pub over_target: bool,
}

pub struct CompleteLogic;

impl CompleteLogic {
    /// Build the completion patch: same downtime, target and delay rules as
    /// the live counter.
    pub fn plan(
        rec: &MoldChange,
        req: &CompleteRequest,
        now: DateTime<Utc>,
        target: Target,
    ) -> AppResult<CompletePlan> {
        if rec.status.is_completed() {
            return Err(AppError::BadRequest(format!(
                "mold change {} is already completed",
                rec.id
            )));
        }

        let elapsed = match req.minutes {
            Some(m) => u64::from(m) * 60,
            None => rec.elapsed_secs(now),
        };
        if elapsed == 0 {
            return Err(CounterError::NoElapsedTime.into());
        }

        let form = ChangeForm {
            delay_reason: req.delay_reason.clone().unwrap_or_default(),
            delay_description: req.description.clone().unwrap_or_default(),
            ..ChangeForm::from_record(rec)
        };

        let over_target = target.is_exceeded(elapsed);
        if over_target {
            form.validate_delay()?;
        }

        let ended_at = match req.minutes {
            Some(m) => rec.started_at + Duration::minutes(i64::from(m)),
            None => now,
        };

        // a reason left over from an earlier edit does not survive an on-target close
        let delay_reason = if over_target {
            Some(form.stored_delay_reason())
        } else {
            rec.delay_reason.as_ref().map(|_| None)
        };

        let patch = MoldChangePatch {
            delay_reason,
            notes: Some(target.observation(
                elapsed,
                over_target.then_some(form.delay_reason.trim()),
            )),
            ..MoldChangePatch::completion(ended_at, downtime_minutes(elapsed))
        };
        Ok(CompletePlan { patch, over_target })
    }
}

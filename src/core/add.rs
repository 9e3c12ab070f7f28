//! One-shot recording of a mold change from the command line.

use crate::core::calculator::downtime::downtime_minutes;
use crate::core::calculator::target::Target;
use crate::core::counter::{ChangeForm, CounterError, PENDING_NOTES};
use crate::errors::AppResult;
use crate::models::mold_change::NewMoldChange;
use crate::models::shift::Shift;
use crate::models::status::ChangeStatus;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// What `rmoldtracker add` received.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    pub form: ChangeForm,
    /// Defaults to now (open change) or now minus `minutes` (closed change).
    pub started_at: Option<DateTime<Utc>>,
    /// When set the change is recorded as already completed.
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddPlan {
    /// Open a pending change through the claim protocol.
    Claim(NewMoldChange),
    /// Store a completed change as is.
    Record(NewMoldChange),
}

pub struct AddLogic;

impl AddLogic {
    pub fn plan<Tz: TimeZone>(
        req: &AddRequest,
        now: &DateTime<Tz>,
        target: Target,
    ) -> AppResult<AddPlan> {
        let line = req.form.validate()?;
        let tz = now.timezone();
        let now_utc = now.with_timezone(&Utc);

        // 1️⃣ cambio ancora aperto → claim
        let Some(minutes) = req.minutes else {
            let started = req.started_at.unwrap_or(now_utc);
            return Ok(AddPlan::Claim(NewMoldChange {
                line,
                previous_mold_id: req.form.previous_mold.trim().to_string(),
                new_mold_id: req.form.new_mold.trim().to_string(),
                supervisor_name: req.form.supervisor.trim().to_string(),
                shift: Shift::at(&started.with_timezone(&tz)).label().to_string(),
                reason_code: req.form.reason.trim().to_string(),
                started_at: Some(started),
                ended_at: None,
                downtime_minutes: 0,
                status: ChangeStatus::Pending,
                delay_reason: None,
                notes: PENDING_NOTES.to_string(),
            }));
        };

        // 2️⃣ cambio già concluso → stesse regole del salvataggio dal contatore
        if minutes == 0 {
            return Err(CounterError::NoElapsedTime.into());
        }
        let elapsed = u64::from(minutes) * 60;
        let over_target = target.is_exceeded(elapsed);
        if over_target {
            req.form.validate_delay()?;
        }

        let started = req
            .started_at
            .unwrap_or(now_utc - Duration::minutes(i64::from(minutes)));
        let ended = started + Duration::minutes(i64::from(minutes));

        Ok(AddPlan::Record(NewMoldChange {
            line,
            previous_mold_id: req.form.previous_mold.trim().to_string(),
            new_mold_id: req.form.new_mold.trim().to_string(),
            supervisor_name: req.form.supervisor.trim().to_string(),
            shift: Shift::at(&ended.with_timezone(&tz)).label().to_string(),
            reason_code: req.form.reason.trim().to_string(),
            started_at: Some(started),
            ended_at: Some(ended),
            downtime_minutes: downtime_minutes(elapsed),
            status: ChangeStatus::Completed,
            delay_reason: if over_target {
                req.form.stored_delay_reason()
            } else {
                None
            },
            notes: target.observation(
                elapsed,
                over_target.then_some(req.form.delay_reason.trim()),
            ),
        }))
    }
}

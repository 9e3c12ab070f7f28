//! Live mold-change counter.
//!
//! [`CounterState`] is the pure state machine: form, elapsed seconds and
//! the id of the shared active record it holds. It never sleeps and never
//! does I/O; [`controller::CounterController`] drives it with a 1 s ticker,
//! the polling cache and the store mutations.

pub mod controller;
pub mod form;

pub use form::ChangeForm;

use crate::core::calculator::downtime::{downtime_minutes, format_hms};
use crate::core::calculator::target::Target;
use crate::models::line::Line;
use crate::models::mold_change::{MoldChange, MoldChangePatch, NewMoldChange};
use crate::models::shift::Shift;
use crate::models::status::ChangeStatus;
use chrono::{DateTime, Duration, TimeZone, Utc};
use thiserror::Error;

/// Notes written on the pending record created at start.
pub const PENDING_NOTES: &str = "PENDIENTE | En curso...";

/// Validation failures: reported inline, nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    #[error("Fill in all required fields first (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("The counter has no elapsed time to save")]
    NoElapsedTime,

    #[error("Target exceeded: a delay reason is required")]
    DelayReasonRequired,

    #[error("Delay reason \"Otro\" requires a description")]
    DelayDescriptionRequired,

    #[error("This change is already saved; reset the counter first")]
    AlreadySaved,

    #[error("A save is already in progress")]
    SaveInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Counting (or paused) for a change. `record_id` is the shared record
    /// this client holds, if any.
    Claimed { record_id: Option<String> },
    /// Completed and stored; form kept until reset.
    Saved { record_id: String },
}

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    /// Another client's active record was taken over.
    Adopted {
        record_id: String,
        line: Line,
        elapsed: u64,
    },
    /// The held record was completed or deleted elsewhere.
    Diverged { record_id: String },
    TargetExceeded { elapsed: u64 },
}

/// Result of a start request.
#[derive(Debug, Clone, PartialEq)]
pub enum StartPlan {
    AlreadyRunning,
    /// Counting resumed on the existing record / elapsed time.
    Resume,
    /// A pending record has to be created (claimed) first.
    Create(NewMoldChange),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveAction {
    Update { id: String, patch: MoldChangePatch },
    Create(NewMoldChange),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    pub action: SaveAction,
    pub line: Line,
    pub downtime_minutes: u32,
    pub over_target: bool,
}

/// Read-only picture of the counter for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterView {
    pub phase: Phase,
    pub form: ChangeForm,
    pub elapsed: u64,
    pub running: bool,
    pub over_target: bool,
    /// Seconds left before the target, negative once exceeded.
    pub remaining: i64,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CounterState {
    pub form: ChangeForm,
    phase: Phase,
    elapsed: u64,
    running: bool,
    started_at: Option<DateTime<Utc>>,
    starting: bool,
    saving: bool,
    target: Target,
}

impl Default for CounterState {
    fn default() -> Self {
        Self::new(Target::default())
    }
}

impl CounterState {
    pub fn new(target: Target) -> Self {
        Self {
            form: ChangeForm::default(),
            phase: Phase::Idle,
            elapsed: 0,
            running: false,
            started_at: None,
            starting: false,
            saving: false,
            target,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Id of the shared record this client is counting for.
    pub fn active_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::Claimed { record_id } => record_id.as_deref(),
            _ => None,
        }
    }

    pub fn is_over_target(&self) -> bool {
        self.target.is_exceeded(self.elapsed)
    }

    pub fn view(&self) -> CounterView {
        CounterView {
            phase: self.phase.clone(),
            form: self.form.clone(),
            elapsed: self.elapsed,
            running: self.running,
            over_target: self.is_over_target(),
            remaining: self.target.secs() as i64 - self.elapsed as i64,
            started_at: self.started_at,
        }
    }

    // ---------------------------------------------------------------------
    // Start / stop
    // ---------------------------------------------------------------------

    pub fn begin_start<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<StartPlan, CounterError> {
        if matches!(self.phase, Phase::Saved { .. }) {
            return Err(CounterError::AlreadySaved);
        }
        if self.running {
            return Ok(StartPlan::AlreadyRunning);
        }
        let line = self.form.validate()?;
        let now_utc = now.with_timezone(&Utc);

        if self.active_id().is_some() || self.elapsed > 0 {
            if self.phase == Phase::Idle {
                self.phase = Phase::Claimed { record_id: None };
            }
            self.started_at
                .get_or_insert(now_utc - Duration::seconds(self.elapsed as i64));
            self.running = true;
            return Ok(StartPlan::Resume);
        }

        self.starting = true;
        Ok(StartPlan::Create(NewMoldChange {
            line,
            previous_mold_id: self.form.previous_mold.trim().to_string(),
            new_mold_id: self.form.new_mold.trim().to_string(),
            supervisor_name: self.form.supervisor.trim().to_string(),
            shift: Shift::at(now).label().to_string(),
            reason_code: self.form.reason.trim().to_string(),
            started_at: Some(now_utc),
            ended_at: None,
            downtime_minutes: 0,
            status: ChangeStatus::Pending,
            delay_reason: None,
            notes: PENDING_NOTES.to_string(),
        }))
    }

    /// The pending record was created: hold it and start counting.
    pub fn confirm_start(&mut self, rec: &MoldChange) {
        self.starting = false;
        self.phase = Phase::Claimed {
            record_id: Some(rec.id.clone()),
        };
        self.started_at = Some(rec.started_at);
        self.running = true;
    }

    pub fn start_failed(&mut self) {
        self.starting = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// One second passed. Fires once when the target is first exceeded.
    pub fn tick(&mut self) -> Option<CounterEvent> {
        if !self.running {
            return None;
        }
        self.elapsed += 1;

        if self.target.just_exceeded(self.elapsed) {
            Some(CounterEvent::TargetExceeded {
                elapsed: self.elapsed,
            })
        } else {
            None
        }
    }

    // ---------------------------------------------------------------------
    // Reconciliation with the shared record set
    // ---------------------------------------------------------------------

    /// Take over an active record: form, elapsed since its start, counting.
    pub fn adopt(&mut self, rec: &MoldChange, now: DateTime<Utc>) {
        self.form = ChangeForm::from_record(rec);
        self.phase = Phase::Claimed {
            record_id: Some(rec.id.clone()),
        };
        self.started_at = Some(rec.started_at);
        self.elapsed = rec.elapsed_secs(now);
        self.running = true;
        self.starting = false;
    }

    /// Apply the latest poll result.
    ///
    /// While the held record is still active nothing changes, elapsed
    /// included. A held record that vanished resets the counter. With no
    /// countdown running, the first active record is adopted.
    pub fn reconcile(&mut self, records: &[MoldChange], now: DateTime<Utc>) -> Option<CounterEvent> {
        if self.saving || self.starting {
            return None;
        }

        if let Some(id) = self.active_id() {
            if records.iter().any(|r| r.is_active() && r.id == id) {
                return None;
            }
            let record_id = id.to_string();
            self.reset_all();
            return Some(CounterEvent::Diverged { record_id });
        }

        if self.running {
            return None;
        }

        let active = records.iter().find(|r| r.is_active())?;
        self.adopt(active, now);
        Some(CounterEvent::Adopted {
            record_id: active.id.clone(),
            line: active.line,
            elapsed: self.elapsed,
        })
    }

    // ---------------------------------------------------------------------
    // Save / reset
    // ---------------------------------------------------------------------

    /// Validate and build the completing write. Stops the countdown.
    pub fn prepare_save<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Result<SavePlan, CounterError> {
        if matches!(self.phase, Phase::Saved { .. }) {
            return Err(CounterError::AlreadySaved);
        }
        if self.saving {
            return Err(CounterError::SaveInProgress);
        }
        let line = self.form.validate()?;
        if self.elapsed == 0 {
            return Err(CounterError::NoElapsedTime);
        }

        let over_target = self.is_over_target();
        if over_target {
            self.form.validate_delay()?;
        }

        self.running = false;
        self.saving = true;

        let now_utc = now.with_timezone(&Utc);
        let downtime = downtime_minutes(self.elapsed);
        let shift = Shift::at(now).label().to_string();
        let delay_reason = if over_target {
            self.form.stored_delay_reason()
        } else {
            None
        };
        let notes = self.target.observation(
            self.elapsed,
            over_target.then_some(self.form.delay_reason.trim()),
        );

        tracing::debug!(
            elapsed = %format_hms(self.elapsed),
            downtime,
            over_target,
            "save prepared"
        );

        let action = match self.active_id() {
            Some(id) => SaveAction::Update {
                id: id.to_string(),
                patch: MoldChangePatch {
                    line: Some(line),
                    previous_mold_id: Some(self.form.previous_mold.trim().to_string()),
                    new_mold_id: Some(self.form.new_mold.trim().to_string()),
                    supervisor_name: Some(self.form.supervisor.trim().to_string()),
                    shift: Some(shift),
                    reason_code: Some(self.form.reason.trim().to_string()),
                    started_at: None,
                    ended_at: Some(Some(now_utc)),
                    downtime_minutes: Some(downtime),
                    status: Some(ChangeStatus::Completed),
                    delay_reason: delay_reason.map(Some),
                    notes: Some(notes),
                },
            },
            None => SaveAction::Create(NewMoldChange {
                line,
                previous_mold_id: self.form.previous_mold.trim().to_string(),
                new_mold_id: self.form.new_mold.trim().to_string(),
                supervisor_name: self.form.supervisor.trim().to_string(),
                shift,
                reason_code: self.form.reason.trim().to_string(),
                started_at: Some(
                    self.started_at
                        .unwrap_or(now_utc - Duration::seconds(self.elapsed as i64)),
                ),
                ended_at: Some(now_utc),
                downtime_minutes: downtime,
                status: ChangeStatus::Completed,
                delay_reason,
                notes,
            }),
        };

        Ok(SavePlan {
            action,
            line,
            downtime_minutes: downtime,
            over_target,
        })
    }

    pub fn mark_saved(&mut self, record_id: String) {
        self.saving = false;
        self.running = false;
        self.phase = Phase::Saved { record_id };
    }

    /// The write failed: keep everything, paused, so the user can retry.
    pub fn save_failed(&mut self) {
        self.saving = false;
    }

    /// After a save: clear everything. Otherwise clear the timing, keep
    /// the form and let go of the held record.
    pub fn reset(&mut self) {
        if matches!(self.phase, Phase::Saved { .. }) {
            self.reset_all();
            return;
        }
        self.running = false;
        self.elapsed = 0;
        self.started_at = None;
        self.phase = Phase::Idle;
    }

    pub fn reset_all(&mut self) {
        self.form = ChangeForm::default();
        self.phase = Phase::Idle;
        self.elapsed = 0;
        self.running = false;
        self.started_at = None;
        self.starting = false;
        self.saving = false;
    }
}

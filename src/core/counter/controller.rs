//! Async shell around [`CounterState`]: 1 s ticker, poll-driven
//! reconciliation and store writes.

use super::{CounterEvent, CounterState, CounterView, SaveAction, StartPlan};
use crate::cache::{LoadState, PollingCache, Subscription};
use crate::core::calculator::downtime::format_hms;
use crate::core::calculator::target::Target;
use crate::errors::AppResult;
use crate::models::mold_change::{MoldChange, MoldChangePatch};
use crate::models::status::ChangeStatus;
use crate::store::Claim;
use chrono::{Local, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the operator (toast in a GUI, a line in the terminal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// State shared between the controller and its background tasks.
struct Shared {
    state: Mutex<CounterState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, CounterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NoticeLevel::Error => tracing::error!(%message, "counter"),
            NoticeLevel::Warning => tracing::warn!(%message, "counter"),
            _ => tracing::info!(%message, "counter"),
        }
        // receiver gone: nobody is listening anymore
        let _ = self.notices.send(Notice { level, message });
    }

    fn announce(&self, event: CounterEvent) {
        match event {
            CounterEvent::Adopted {
                record_id,
                line,
                elapsed,
            } => self.notify(
                NoticeLevel::Info,
                format!(
                    "Change #{record_id} on {line} already in progress: counting from {}",
                    format_hms(elapsed)
                ),
            ),
            CounterEvent::Diverged { record_id } => self.notify(
                NoticeLevel::Info,
                format!("Change #{record_id} was completed or deleted by another user"),
            ),
            CounterEvent::TargetExceeded { .. } => self.notify(
                NoticeLevel::Warning,
                "TARGET TIME EXCEEDED: the change is past its target",
            ),
        }
    }

    /// Make the ticker task match `running`.
    fn sync_ticker(self: &Arc<Self>) {
        let running = self.state().is_running();
        let mut slot = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        let alive = slot.as_ref().is_some_and(|h| !h.is_finished());

        match (running, alive) {
            (true, false) => *slot = Some(spawn_ticker(Arc::clone(self))),
            (false, true) => {
                if let Some(h) = slot.take() {
                    h.abort();
                }
            }
            _ => {}
        }
    }

    fn abort_ticker(&self) {
        let mut slot = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(h) = slot.take() {
            h.abort();
        }
    }
}

fn spawn_ticker(shared: Arc<Shared>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            ticker.tick().await;
            let event = {
                let mut st = shared.state();
                if !st.is_running() {
                    break;
                }
                st.tick()
            };
            if let Some(ev) = event {
                shared.announce(ev);
            }
        }
    })
}

/// Applies every published cache snapshot to the counter.
fn spawn_reconciler(shared: Arc<Shared>, cache: &PollingCache) -> JoinHandle<()> {
    let mut rx = cache.watch();

    tokio::spawn(async move {
        let mut failing = false;

        while rx.changed().await.is_ok() {
            let snap = rx.borrow_and_update().clone();

            match &snap.state {
                LoadState::Ready => {
                    if failing {
                        failing = false;
                        shared.notify(NoticeLevel::Info, "Connection to the record store restored");
                    }
                }
                LoadState::Failed(msg) => {
                    if !failing {
                        failing = true;
                        shared.notify(
                            NoticeLevel::Error,
                            format!("Could not load mold changes: {msg}"),
                        );
                    }
                    continue;
                }
                LoadState::Loading => continue,
            }

            let event = shared.state().reconcile(&snap.records, Utc::now());
            if let Some(ev) = event {
                shared.announce(ev);
            }
            shared.sync_ticker();
        }
    })
}

pub struct CounterController {
    cache: Arc<PollingCache>,
    shared: Arc<Shared>,
    poll: Option<Subscription>,
    reconciler: Option<JoinHandle<()>>,
}

impl CounterController {
    /// Spawn polling and reconciliation. Must be called inside a tokio runtime.
    pub fn spawn(
        cache: Arc<PollingCache>,
        target: Target,
        poll_period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(CounterState::new(target)),
            ticker: Mutex::new(None),
            notices: tx,
        });

        let reconciler = spawn_reconciler(Arc::clone(&shared), &cache);
        let poll = cache.subscribe(poll_period);

        let ctl = Self {
            cache,
            shared,
            poll: Some(poll),
            reconciler: Some(reconciler),
        };
        (ctl, rx)
    }

    pub fn view(&self) -> CounterView {
        self.shared.state().view()
    }

    /// Edit the form in place.
    pub fn edit_form<F>(&self, edit: F)
    where
        F: FnOnce(&mut super::ChangeForm),
    {
        edit(&mut self.shared.state().form);
    }

    pub async fn start(&self) -> AppResult<()> {
        let plan = self.shared.state().begin_start(&Local::now())?;

        match plan {
            StartPlan::AlreadyRunning => {
                self.shared.notify(NoticeLevel::Info, "The counter is already running");
            }
            StartPlan::Resume => {
                self.shared.notify(NoticeLevel::Info, "Counter resumed");
            }
            StartPlan::Create(new) => match self.cache.claim(new).await {
                Ok(Claim::Created(rec)) => {
                    self.shared.state().confirm_start(&rec);
                    self.shared.notify(
                        NoticeLevel::Success,
                        format!("Change #{} started on {}", rec.id, rec.line),
                    );
                    self.mark_in_progress(&rec).await;
                }
                Ok(Claim::Existing(rec)) => {
                    self.shared.state().adopt(&rec, Utc::now());
                    self.shared.notify(
                        NoticeLevel::Warning,
                        format!(
                            "Change #{} on {} was already in progress: joined it",
                            rec.id, rec.line
                        ),
                    );
                }
                Err(e) => {
                    self.shared.state().start_failed();
                    self.shared.notify(
                        NoticeLevel::Error,
                        format!("Could not create the record in the database: {e}"),
                    );
                    return Err(e);
                }
            },
        }

        self.shared.sync_ticker();
        Ok(())
    }

    /// Best effort: a failure leaves the record pending, which is still active.
    async fn mark_in_progress(&self, rec: &MoldChange) {
        let patch = MoldChangePatch {
            status: Some(ChangeStatus::InProgress),
            ..Default::default()
        };
        if let Err(e) = self.cache.update(&rec.id, patch).await {
            tracing::warn!(id = %rec.id, error = %e, "could not mark change in progress");
        }
    }

    pub fn stop(&self) {
        self.shared.state().stop();
        self.shared.sync_ticker();
    }

    pub async fn save(&self) -> AppResult<MoldChange> {
        let plan = self.shared.state().prepare_save(&Local::now())?;
        self.shared.sync_ticker();

        let result = match plan.action {
            SaveAction::Update { id, patch } => self.cache.update(&id, patch).await,
            SaveAction::Create(new) => self.cache.create(new).await,
        };

        match result {
            Ok(rec) => {
                self.shared.state().mark_saved(rec.id.clone());
                let label = if plan.over_target {
                    "(Fuera de meta)"
                } else {
                    "(En meta)"
                };
                self.shared.notify(
                    NoticeLevel::Success,
                    format!(
                        "Change recorded: {} - {} min {label}",
                        plan.line, plan.downtime_minutes
                    ),
                );
                Ok(rec)
            }
            Err(e) => {
                self.shared.state().save_failed();
                self.shared
                    .notify(NoticeLevel::Error, format!("Could not save the change: {e}"));
                Err(e)
            }
        }
    }

    pub fn reset(&self) {
        self.shared.state().reset();
        self.shared.sync_ticker();
    }

    /// Cancel polling, reconciliation and the ticker.
    pub fn shutdown(&mut self) {
        if let Some(mut poll) = self.poll.take() {
            poll.stop();
        }
        if let Some(h) = self.reconciler.take() {
            h.abort();
        }
        self.shared.abort_ticker();
    }
}

impl Drop for CounterController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::counter::{ChangeForm, Phase};
    use crate::models::line::Line;
    use crate::models::mold_change::NewMoldChange;
    use crate::store::RecordStore;
    use crate::store::sqlite::SqliteStore;
    use chrono::Duration as ChronoDuration;

    const POLL: Duration = Duration::from_millis(25);

    fn active_record(started_secs_ago: i64) -> NewMoldChange {
        NewMoldChange {
            line: Line::Tb2,
            previous_mold_id: "T-7".into(),
            new_mold_id: "T-8".into(),
            supervisor_name: "Raquel".into(),
            shift: "Primer turno".into(),
            reason_code: "Mantenimiento preventivo".into(),
            started_at: Some(Utc::now() - ChronoDuration::seconds(started_secs_ago)),
            ended_at: None,
            downtime_minutes: 0,
            status: ChangeStatus::InProgress,
            delay_reason: None,
            notes: String::new(),
        }
    }

    async fn wait_for<F: Fn(&CounterView) -> bool>(ctl: &CounterController, cond: F) -> CounterView {
        for _ in 0..80 {
            let view = ctl.view();
            if cond(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("condition not reached, last view: {:?}", ctl.view());
    }

    #[tokio::test]
    async fn idle_client_adopts_record_started_elsewhere() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.create(active_record(600)).await.unwrap();

        let cache = PollingCache::new(store.clone());
        let (mut ctl, mut notices) = CounterController::spawn(cache, Target::default(), POLL);

        let view = wait_for(&ctl, |v| v.running).await;
        assert!((600..=605).contains(&view.elapsed), "elapsed {}", view.elapsed);
        assert_eq!(view.form.supervisor, "Raquel");

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.contains("already in progress"));
        ctl.shutdown();
    }

    #[tokio::test]
    async fn start_claims_pending_record_then_diverges_when_deleted() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let cache = PollingCache::new(store.clone());
        let (mut ctl, _notices) = CounterController::spawn(cache, Target::default(), POLL);

        ctl.edit_form(|f| {
            *f = ChangeForm {
                line: Some(Line::Edf2),
                supervisor: "Luis".into(),
                previous_mold: "D-1".into(),
                new_mold: "D-2".into(),
                reason: "Defectos de calidad".into(),
                ..Default::default()
            }
        });
        ctl.start().await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ChangeStatus::InProgress);
        let id = records[0].id.clone();
        assert_eq!(ctl.view().phase, Phase::Claimed { record_id: Some(id.clone()) });

        store.delete(&id).await.unwrap();
        let view = wait_for(&ctl, |v| v.phase == Phase::Idle).await;
        assert!(!view.running);
        assert_eq!(view.elapsed, 0);
        assert_eq!(view.form, ChangeForm::default());
        ctl.shutdown();
    }

    #[tokio::test]
    async fn second_start_joins_the_existing_change() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let existing = store.create(active_record(30)).await.unwrap();

        // start runs before the first poll gets a chance to adopt
        let cache = PollingCache::new(store.clone());
        let (mut ctl, _notices) =
            CounterController::spawn(cache, Target::default(), Duration::from_secs(3600));
        ctl.edit_form(|f| {
            f.line = Some(Line::Tb1);
            f.supervisor = "Otra".into();
            f.previous_mold = "Q-1".into();
            f.new_mold = "Q-2".into();
            f.reason = "Otro".into();
        });

        ctl.start().await.unwrap();
        let view = ctl.view();
        assert_eq!(view.phase, Phase::Claimed { record_id: Some(existing.id.clone()) });
        assert_eq!(view.form.line, Some(Line::Tb2));
        assert_eq!(store.list().await.unwrap().len(), 1);
        ctl.shutdown();
    }

    #[tokio::test]
    async fn save_after_target_completes_the_record() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.create(active_record(2730)).await.unwrap();

        let cache = PollingCache::new(store.clone());
        let (mut ctl, _notices) = CounterController::spawn(cache, Target::default(), POLL);
        wait_for(&ctl, |v| v.running).await;

        let err = ctl.save().await.unwrap_err();
        assert!(err.to_string().contains("delay reason"));

        ctl.edit_form(|f| f.delay_reason = "Falla mecánica".into());
        let rec = ctl.save().await.unwrap();
        assert_eq!(rec.status, ChangeStatus::Completed);
        assert_eq!(rec.downtime_minutes, 46);
        assert_eq!(rec.delay_reason.as_deref(), Some("Falla mecánica"));
        assert!(rec.ended_at.is_some());
        assert!(matches!(ctl.view().phase, Phase::Saved { .. }));

        // the next polls must not undo the save
        tokio::time::sleep(POLL * 3).await;
        assert!(matches!(ctl.view().phase, Phase::Saved { .. }));

        ctl.reset();
        assert_eq!(ctl.view().form, ChangeForm::default());
        ctl.shutdown();
    }
}

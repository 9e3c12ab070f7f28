//! `rmoldtracker counter`: terminal front-end for the live counter.
//!
//! Reads one command per line from stdin while the controller polls the
//! store and ticks in the background. Notices (adoption, divergence,
//! target exceeded, store errors) are printed as they arrive.

use crate::cache::PollingCache;
use crate::cli::commands::schedule::print_next;
use crate::cli::parser::Commands;
use crate::cli::{parse_line, runtime, slot_store};
use crate::config::Config;
use crate::core::calculator::downtime::format_hms;
use crate::core::calculator::target::Target;
use crate::core::counter::controller::{CounterController, Notice, NoticeLevel};
use crate::core::counter::{ChangeForm, CounterView, Phase};
use crate::errors::{AppError, AppResult};
use crate::models::line::Line;
use crate::models::mold_change::{CHANGE_REASONS, DELAY_REASONS};
use crate::models::schedule::{CurrentMoldInfo, ScheduledChange};
use crate::schedule::ScheduleBook;
use crate::schedule::slots::{MOLD_INFO_SLOT, load_slot};
use crate::store::{self, RecordStore};
use crate::ui::messages::{error, header, info, success, warning};
use crate::utils::colors::{color_for_target, paint};
use crate::utils::time::format_local_time;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, interval_at};

/// How often a running counter prints its elapsed time.
const PROGRESS_EVERY: Duration = Duration::from_secs(60);

/// One form field edit typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FormEdit {
    Line(Line),
    Supervisor(String),
    PreviousMold(String),
    NewMold(String),
    Reason(String),
    DelayReason(String),
    DelayDescription(String),
}

impl FormEdit {
    fn apply(self, form: &mut ChangeForm) {
        match self {
            FormEdit::Line(l) => form.line = Some(l),
            FormEdit::Supervisor(s) => form.supervisor = s,
            FormEdit::PreviousMold(s) => form.previous_mold = s,
            FormEdit::NewMold(s) => form.new_mold = s,
            FormEdit::Reason(s) => form.reason = s,
            FormEdit::DelayReason(s) => form.delay_reason = s,
            FormEdit::DelayDescription(s) => form.delay_description = s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CounterInput {
    Start,
    Stop,
    Save,
    Reset,
    Status,
    Reasons,
    Help,
    Quit,
    Edit(FormEdit),
}

/// `3` → third entry of `options`; otherwise a case-insensitive match.
fn pick(options: &[&str], raw: &str) -> Option<String> {
    if let Ok(n) = raw.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .map(|s| s.to_string());
    }
    options
        .iter()
        .find(|o| o.to_lowercase() == raw.to_lowercase())
        .map(|s| s.to_string())
}

pub(crate) fn parse_input(raw: &str) -> Result<CounterInput, String> {
    let raw = raw.trim();
    let (word, rest) = match raw.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (raw, ""),
    };

    let needs_value = |what: &str| {
        if rest.is_empty() {
            Err(format!("`{word}` needs a {what}"))
        } else {
            Ok(rest.to_string())
        }
    };

    let input = match word.to_lowercase().as_str() {
        "start" => CounterInput::Start,
        "stop" => CounterInput::Stop,
        "save" => CounterInput::Save,
        "reset" => CounterInput::Reset,
        "status" | "s" | "" => CounterInput::Status,
        "reasons" => CounterInput::Reasons,
        "help" | "?" => CounterInput::Help,
        "quit" | "exit" | "q" => CounterInput::Quit,
        "line" => {
            let code = needs_value("line code")?;
            let line = Line::from_code(&code).ok_or_else(|| format!("unknown line '{code}'"))?;
            CounterInput::Edit(FormEdit::Line(line))
        }
        "sup" | "supervisor" => CounterInput::Edit(FormEdit::Supervisor(needs_value("name")?)),
        "prev" => CounterInput::Edit(FormEdit::PreviousMold(needs_value("mold id")?)),
        "new" => CounterInput::Edit(FormEdit::NewMold(needs_value("mold id")?)),
        "reason" => {
            let v = needs_value("reason")?;
            // free text is accepted as well
            CounterInput::Edit(FormEdit::Reason(pick(&CHANGE_REASONS, &v).unwrap_or(v)))
        }
        "delay" => {
            let v = needs_value("delay reason")?;
            let reason = pick(&DELAY_REASONS, &v)
                .ok_or_else(|| format!("unknown delay reason '{v}' (see `reasons`)"))?;
            CounterInput::Edit(FormEdit::DelayReason(reason))
        }
        "desc" => CounterInput::Edit(FormEdit::DelayDescription(needs_value("description")?)),
        other => return Err(format!("unknown command '{other}' (type `help`)")),
    };
    Ok(input)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Counter {
        line,
        supervisor,
        previous_mold,
        new_mold,
        reason,
    } = cmd
    {
        // 1️⃣ precompilazione del form da riga di comando
        let mut prefill = Vec::new();
        if let Some(l) = line {
            prefill.push(FormEdit::Line(parse_line(l)?));
        }
        if let Some(s) = supervisor {
            prefill.push(FormEdit::Supervisor(s.clone()));
        }
        if let Some(m) = previous_mold {
            prefill.push(FormEdit::PreviousMold(m.clone()));
        }
        if let Some(m) = new_mold {
            prefill.push(FormEdit::NewMold(m.clone()));
        }
        if let Some(r) = reason {
            prefill.push(FormEdit::Reason(r.clone()));
        }

        // 2️⃣ stato locale letto una sola volta all'avvio
        let slots = slot_store(cfg);
        let next = match ScheduleBook::load(slots, Utc::now()) {
            Ok(book) => book.next(Utc::now()).cloned(),
            Err(e) => {
                warning(format!("Could not read the schedule: {e}"));
                None
            }
        };
        let mold_info: Option<CurrentMoldInfo> =
            load_slot(&slot_store(cfg), MOLD_INFO_SLOT).unwrap_or_default();

        let session = Session {
            target: Target::from_minutes(cfg.target_minutes),
            poll: Duration::from_secs(cfg.poll_interval_secs.max(1)),
            next,
            mold_info,
        };

        let store = store::open(cfg)?;
        runtime()?.block_on(session.run(store, prefill))?;
    }
    Ok(())
}

struct Session {
    target: Target,
    poll: Duration,
    next: Option<ScheduledChange>,
    mold_info: Option<CurrentMoldInfo>,
}

impl Session {
    async fn run(&self, store: Arc<dyn RecordStore>, prefill: Vec<FormEdit>) -> AppResult<()> {
        let cache = PollingCache::new(store);
        let (mut ctl, mut notices) = CounterController::spawn(cache, self.target, self.poll);
        ctl.edit_form(|form| prefill.into_iter().for_each(|e| e.apply(form)));

        header("rMoldTracker live counter");
        print_help();

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut progress = interval_at(Instant::now() + PROGRESS_EVERY, PROGRESS_EVERY);

        loop {
            tokio::select! {
                Some(notice) = notices.recv() => print_notice(&notice),
                _ = progress.tick() => {
                    let view = ctl.view();
                    if view.running {
                        println!("{}", self.clock_line(&view));
                    }
                }
                line = stdin.next_line() => {
                    // EOF chiude la sessione come `quit`
                    let Some(line) = line? else { break };
                    match parse_input(&line) {
                        Ok(CounterInput::Quit) => break,
                        Ok(input) => self.execute(&ctl, input).await,
                        Err(msg) => warning(msg),
                    }
                }
            }
        }

        ctl.shutdown();
        info("Counter closed.");
        Ok(())
    }

    async fn execute(&self, ctl: &CounterController, input: CounterInput) {
        let result = match input {
            CounterInput::Start => ctl.start().await,
            CounterInput::Stop => {
                ctl.stop();
                info(format!("Counter stopped at {}", format_hms(ctl.view().elapsed)));
                Ok(())
            }
            CounterInput::Save => ctl.save().await.map(|_| ()),
            CounterInput::Reset => {
                ctl.reset();
                info("Counter reset.");
                Ok(())
            }
            CounterInput::Status => {
                self.print_status(&ctl.view());
                Ok(())
            }
            CounterInput::Reasons => {
                print_reasons();
                Ok(())
            }
            CounterInput::Help => {
                print_help();
                Ok(())
            }
            CounterInput::Edit(edit) => {
                ctl.edit_form(|form| edit.apply(form));
                Ok(())
            }
            CounterInput::Quit => Ok(()),
        };

        // gli errori dello store arrivano già come notice
        if let Err(AppError::Counter(e)) = result {
            warning(e);
        }
    }

    fn clock_line(&self, view: &CounterView) -> String {
        let clock = paint(color_for_target(view.over_target), &format_hms(view.elapsed));
        format!("⏱️  {clock} (Meta: {} min)", self.target.minutes())
    }

    fn print_status(&self, view: &CounterView) {
        let phase = match &view.phase {
            Phase::Idle => "idle".to_string(),
            Phase::Claimed { record_id: Some(id) } => format!("change #{id}"),
            Phase::Claimed { record_id: None } => "local count (no record)".to_string(),
            Phase::Saved { record_id } => format!("saved as #{record_id}"),
        };
        let state = if view.running { "running" } else { "stopped" };
        let dash = |s: &str| if s.trim().is_empty() { "-".to_string() } else { s.to_string() };

        println!();
        println!("{}  [{phase}, {state}]", self.clock_line(view));
        if view.over_target {
            println!("   {}", paint(color_for_target(true), "FUERA DE META"));
        } else {
            println!("   {} left", format_hms(view.remaining.max(0) as u64));
        }
        if let Some(started) = view.started_at {
            println!("   started at {}", format_local_time(started));
        }

        let f = &view.form;
        println!(
            "   line {} | supervisor {} | {} → {} | reason {}",
            f.line.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
            dash(&f.supervisor),
            dash(&f.previous_mold),
            dash(&f.new_mold),
            dash(&f.reason),
        );
        if !f.delay_reason.is_empty() {
            println!(
                "   delay: {} {}",
                f.delay_reason,
                dash(&f.delay_description)
            );
        }

        if let Some(m) = &self.mold_info {
            println!("   current mold: {} ({})", dash(&m.mold_id), dash(&m.cycle_time));
        }
        if let Some(next) = &self.next {
            print_next(next, Utc::now());
        }
        println!();
    }
}

fn print_notice(n: &Notice) {
    match n.level {
        NoticeLevel::Info => info(&n.message),
        NoticeLevel::Success => success(&n.message),
        NoticeLevel::Warning => warning(&n.message),
        NoticeLevel::Error => error(&n.message),
    }
}

fn print_reasons() {
    println!("Change reasons:");
    for (i, r) in CHANGE_REASONS.iter().enumerate() {
        println!("  {}. {r}", i + 1);
    }
    println!("Delay reasons:");
    for (i, r) in DELAY_REASONS.iter().enumerate() {
        println!("  {}. {r}", i + 1);
    }
}

fn print_help() {
    println!(
        "Commands:
  line <TB1|TB2|TB3|EDF1|EDF2>   sup <name>   prev <mold>   new <mold>
  reason <n|text>   delay <n|text>   desc <text>   reasons
  start   stop   save   reset   status   help   quit"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_edits() {
        assert_eq!(parse_input(" start "), Ok(CounterInput::Start));
        assert_eq!(parse_input(""), Ok(CounterInput::Status));
        assert_eq!(
            parse_input("line edf2"),
            Ok(CounterInput::Edit(FormEdit::Line(Line::Edf2)))
        );
        assert_eq!(
            parse_input("sup Ana María"),
            Ok(CounterInput::Edit(FormEdit::Supervisor("Ana María".into())))
        );
        assert!(parse_input("line TB7").is_err());
        assert!(parse_input("prev").is_err());
        assert!(parse_input("launch").is_err());
    }

    #[test]
    fn reasons_by_index_or_name() {
        assert_eq!(
            parse_input("delay 3"),
            Ok(CounterInput::Edit(FormEdit::DelayReason("Falla mecánica".into())))
        );
        assert_eq!(
            parse_input("delay otro"),
            Ok(CounterInput::Edit(FormEdit::DelayReason("Otro".into())))
        );
        assert!(parse_input("delay 99").is_err());
        assert_eq!(
            parse_input("reason Molde dañado"),
            Ok(CounterInput::Edit(FormEdit::Reason("Molde dañado".into())))
        );
    }

    #[test]
    fn edits_land_in_the_form() {
        let mut form = ChangeForm::default();
        FormEdit::Line(Line::Tb3).apply(&mut form);
        FormEdit::DelayDescription("Grúa".into()).apply(&mut form);
        assert_eq!(form.line, Some(Line::Tb3));
        assert_eq!(form.delay_description, "Grúa");
    }
}

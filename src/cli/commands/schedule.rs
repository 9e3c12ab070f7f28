use crate::cli::parser::{Commands, ScheduleAction};
use crate::cli::{parse_line, slot_store};
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::schedule::ScheduledChange;
use crate::schedule::{Countdown, ScheduleBook};
use crate::ui::messages::{info, success};
use crate::utils::Table;
use crate::utils::colors::{color_for_urgency, paint};
use crate::utils::time::{format_local, parse_local_datetime};
use chrono::{DateTime, Utc};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Schedule { action } = cmd {
        let now = Utc::now();
        let mut book = ScheduleBook::load(slot_store(cfg), now)?;

        match action {
            ScheduleAction::Add {
                date,
                mold_id,
                line,
                description,
            } => {
                let line = parse_line(line)?;
                let when = parse_local_datetime(date)?;
                let entry = book.add(when, mold_id, description, line.code())?;
                success(format!(
                    "Reminder {} added: {} on {} at {}",
                    short_id(&entry.id),
                    entry.mold_id,
                    entry.line,
                    format_local(entry.date)
                ));
            }
            ScheduleAction::List { days } => {
                let entries: Vec<&ScheduledChange> = match days {
                    Some(d) => book.upcoming(now, *d),
                    None => book.entries().iter().collect(),
                };
                if entries.is_empty() {
                    info("No scheduled changes.");
                } else {
                    print!("{}", render_table(&entries, now));
                }
            }
            ScheduleAction::Remove { id } => {
                let removed = book.remove(id)?;
                success(format!(
                    "Reminder {} removed ({} on {})",
                    short_id(&removed.id),
                    removed.mold_id,
                    removed.line
                ));
            }
            ScheduleAction::Update { id, date } => {
                let when = parse_local_datetime(date)?;
                book.update_date(id, when)?;
                success(format!("Reminder moved to {}", format_local(when)));
            }
            ScheduleAction::Next => match book.next(now) {
                Some(next) => print_next(next, now),
                None => info("No upcoming changes scheduled."),
            },
        }
    }
    Ok(())
}

/// First block of the uuid, enough to address a reminder.
fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

pub(crate) fn print_next(next: &ScheduledChange, now: DateTime<Utc>) {
    let countdown = Countdown::until(next.date, now);
    println!(
        "📅 Next change: {} on {} at {}",
        next.mold_id,
        next.line,
        format_local(next.date)
    );
    if !next.description.is_empty() {
        println!("   {}", next.description);
    }
    println!(
        "⏳ {}",
        paint(color_for_urgency(countdown.urgency()), &countdown.to_string())
    );
}

fn render_table(entries: &[&ScheduledChange], now: DateTime<Utc>) -> String {
    let mut table = Table::new(["ID", "Date", "Line", "Mold", "Countdown", "Description"]);
    for e in entries {
        table.add_row(vec![
            short_id(&e.id).to_string(),
            format_local(e.date),
            e.line.clone(),
            e.mold_id.clone(),
            Countdown::until(e.date, now).to_string(),
            e.description.clone(),
        ]);
    }
    table.render()
}

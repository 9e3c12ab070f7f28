use crate::cli::parser::Commands;
use crate::cli::runtime;
use crate::cli::commands::list::render_table;
use crate::config::Config;
use crate::core::stats::{Dashboard, history};
use crate::errors::AppResult;
use crate::models::mold_change::MoldChange;
use crate::store;
use crate::ui::messages::header;
use crate::utils::Table;
use crate::utils::colors::{GREEN, YELLOW, paint};
use crate::utils::formatting::{bold, optional_minutes};
use crate::utils::time::format_local;
use chrono::Local;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status { history: show_history, days } = cmd {
        let store = store::open(cfg)?;
        let records = runtime()?.block_on(store.list())?;
        let now = Local::now();

        if *show_history {
            let done = history(&records, &now, *days);
            header(format!("Completed changes, last {days} days"));
            if done.is_empty() {
                println!("No completed changes.");
            } else {
                let refs: Vec<&MoldChange> = done.iter().collect();
                print!("{}", render_table(&refs));
            }
            return Ok(());
        }

        let d = Dashboard::compute(&records, &now);
        print_dashboard(&d);
    }
    Ok(())
}

fn print_dashboard(d: &Dashboard) {
    // ---- today ----
    header("Today");
    println!(
        "{} changes | {} completed | {} in process | {}% done | avg downtime {}",
        bold(&d.today.total.to_string()),
        d.today.completed,
        d.today.in_process,
        d.today.completion_pct,
        optional_minutes(d.today.avg_downtime),
    );

    // ---- per line ----
    println!();
    header("Lines");
    let mut lines = Table::new(["Line", "State", "Last completed", "Today", "Week", "Week avg"]);
    for l in &d.lines {
        lines.add_row(vec![
            l.line.to_string(),
            if l.in_process { "IN PROCESS" } else { "idle" }.to_string(),
            l.last_completed
                .as_ref()
                .map(|r| {
                    format!(
                        "#{} {} ({} min)",
                        r.id,
                        format_local(r.ended_at.unwrap_or(r.started_at)),
                        r.downtime_minutes
                    )
                })
                .unwrap_or_else(|| "-".into()),
            l.today.to_string(),
            l.week_changes.to_string(),
            optional_minutes(l.week_avg_downtime),
        ]);
    }
    let rendered = lines.render();
    for row in rendered.lines() {
        if row.contains("IN PROCESS") {
            println!("{}", paint(YELLOW, row));
        } else {
            println!("{row}");
        }
    }

    // ---- status & trend ----
    println!();
    header("Overview");
    println!(
        "pending {} | in_progress {} | {}",
        d.statuses.pending,
        d.statuses.in_progress,
        paint(GREEN, &format!("completed {}", d.statuses.completed)),
    );
    println!(
        "avg downtime: week {} | month {}",
        optional_minutes(d.weekly_avg),
        optional_minutes(d.monthly_avg)
    );
    println!();
    for day in &d.trend {
        println!(
            "{}  {:<20} {}/{}",
            day.date.format("%a %d/%m"),
            "█".repeat(day.changes.min(20)),
            day.completed,
            day.changes
        );
    }
}

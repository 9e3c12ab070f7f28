use crate::cli::parser::Commands;
use crate::cli::{parse_line, runtime};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::line::Line;
use crate::models::mold_change::MoldChange;
use crate::models::status::ChangeStatus;
use crate::store;
use crate::utils::Table;
use crate::utils::time::format_local;
use chrono::{DateTime, Duration, Local, Utc};

/// Filters accepted by `list`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ListFilter {
    pub status: Option<ChangeStatus>,
    pub line: Option<Line>,
    pub today: bool,
    pub days: Option<i64>,
}

impl ListFilter {
    fn matches(&self, r: &MoldChange, now: DateTime<Local>) -> bool {
        if self.status.is_some_and(|s| s != r.status) {
            return false;
        }
        if self.line.is_some_and(|l| l != r.line) {
            return false;
        }
        if self.today && r.started_local().date_naive() != now.date_naive() {
            return false;
        }
        if let Some(days) = self.days {
            let since = (now - Duration::days(days)).with_timezone(&Utc);
            if r.started_at < since {
                return false;
            }
        }
        true
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List {
        status,
        line,
        today,
        days,
    } = cmd
    {
        let filter = ListFilter {
            status: status
                .as_deref()
                .map(|s| ChangeStatus::from_cli_str(s).ok_or_else(|| AppError::InvalidStatus(s.into())))
                .transpose()?,
            line: line.as_deref().map(parse_line).transpose()?,
            today: *today,
            days: *days,
        };

        let store = store::open(cfg)?;
        let records = runtime()?.block_on(store.list())?;

        let now = Local::now();
        let selected: Vec<&MoldChange> = records.iter().filter(|r| filter.matches(r, now)).collect();

        if selected.is_empty() {
            println!("No mold changes found.");
            return Ok(());
        }

        print!("{}", render_table(&selected));
        println!("\n{} change(s)", selected.len());
    }
    Ok(())
}

pub(crate) fn render_table(records: &[&MoldChange]) -> String {
    let mut table = Table::new([
        "ID", "Line", "Molds", "Supervisor", "Shift", "Start", "End", "Downtime", "Status", "Delay",
    ]);

    for r in records {
        table.add_row(vec![
            r.id.clone(),
            r.line.to_string(),
            format!("{} → {}", r.previous_mold_id, r.new_mold_id),
            r.supervisor_name.clone(),
            r.shift.clone(),
            format_local(r.started_at),
            r.ended_at.map(format_local).unwrap_or_else(|| "-".into()),
            if r.status.is_completed() {
                format!("{} min", r.downtime_minutes)
            } else {
                "-".into()
            },
            r.status.to_string(),
            r.delay_reason.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    table.render()
}

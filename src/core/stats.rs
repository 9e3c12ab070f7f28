//! Dashboard figures computed from the cached record set.

use crate::core::calculator::downtime::average_minutes;
use crate::models::line::Line;
use crate::models::mold_change::MoldChange;
use crate::models::status::ChangeStatus;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodaySummary {
    pub total: usize,
    pub completed: usize,
    pub in_process: usize,
    /// Completed over total, in percent.
    pub completion_pct: u32,
    pub avg_downtime: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSummary {
    pub line: Line,
    /// A pending / in-progress change is open on this line.
    pub in_process: bool,
    pub last_completed: Option<MoldChange>,
    pub today: usize,
    pub week_changes: usize,
    pub week_avg_downtime: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTrend {
    pub date: NaiveDate,
    pub changes: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub today: TodaySummary,
    pub lines: Vec<LineSummary>,
    pub statuses: StatusCounts,
    /// Last 7 days, oldest first.
    pub trend: Vec<DayTrend>,
    pub weekly_avg: Option<u32>,
    pub monthly_avg: Option<u32>,
}

fn local_date<Tz: TimeZone>(rec: &MoldChange, tz: &Tz) -> NaiveDate {
    rec.started_at.with_timezone(tz).date_naive()
}

/// Average downtime of completed records with downtime > 0.
fn avg_downtime<'a, I>(records: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a MoldChange>,
{
    average_minutes(
        records
            .into_iter()
            .filter(|r| r.status.is_completed() && r.downtime_minutes > 0)
            .map(|r| r.downtime_minutes),
    )
}

impl Dashboard {
    pub fn compute<Tz: TimeZone>(records: &[MoldChange], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today_date = now.date_naive();
        let week_start = (now.clone() - Duration::days(7)).with_timezone(&Utc);
        let month_start = (now.clone() - Duration::days(30)).with_timezone(&Utc);

        let is_today = |r: &&MoldChange| local_date(r, &tz) == today_date;
        let in_week = |r: &&MoldChange| r.started_at >= week_start;

        // ---- today ----
        let today: Vec<&MoldChange> = records.iter().filter(is_today).collect();
        let completed_today: Vec<&MoldChange> = today
            .iter()
            .copied()
            .filter(|r| r.status.is_completed())
            .collect();
        let completion_pct = if today.is_empty() {
            0
        } else {
            ((completed_today.len() as f64 / today.len() as f64) * 100.0).round() as u32
        };
        let today_summary = TodaySummary {
            total: today.len(),
            completed: completed_today.len(),
            in_process: today.iter().filter(|r| r.is_active()).count(),
            completion_pct,
            avg_downtime: average_minutes(completed_today.iter().map(|r| r.downtime_minutes)),
        };

        // ---- per line ----
        let lines = Line::ALL
            .iter()
            .map(|&line| {
                let of_line: Vec<&MoldChange> =
                    records.iter().filter(|r| r.line == line).collect();
                let week: Vec<&MoldChange> = of_line.iter().copied().filter(in_week).collect();

                LineSummary {
                    line,
                    in_process: of_line.iter().any(|r| r.is_active()),
                    last_completed: of_line
                        .iter()
                        .filter(|r| r.status.is_completed())
                        .max_by_key(|r| r.started_at)
                        .map(|r| (*r).clone()),
                    today: of_line.iter().copied().filter(is_today).count(),
                    week_changes: week.len(),
                    week_avg_downtime: avg_downtime(week),
                }
            })
            .collect();

        // ---- status distribution ----
        let mut statuses = StatusCounts::default();
        for r in records {
            match r.status {
                ChangeStatus::Pending => statuses.pending += 1,
                ChangeStatus::InProgress => statuses.in_progress += 1,
                ChangeStatus::Completed => statuses.completed += 1,
            }
        }

        // ---- 7-day trend ----
        let trend = (0..7)
            .rev()
            .map(|back| {
                let date = today_date - Duration::days(back);
                let day: Vec<&MoldChange> = records
                    .iter()
                    .filter(|r| local_date(r, &tz) == date)
                    .collect();
                DayTrend {
                    date,
                    changes: day.len(),
                    completed: day.iter().filter(|r| r.status.is_completed()).count(),
                }
            })
            .collect();

        Dashboard {
            today: today_summary,
            lines,
            statuses,
            trend,
            weekly_avg: avg_downtime(records.iter().filter(in_week)),
            monthly_avg: avg_downtime(records.iter().filter(|r| r.started_at >= month_start)),
        }
    }
}

/// Completed records of the last `days` days, most recent first.
pub fn history<Tz: TimeZone>(records: &[MoldChange], now: &DateTime<Tz>, days: i64) -> Vec<MoldChange> {
    let since = (now.clone() - Duration::days(days)).with_timezone(&Utc);
    let mut out: Vec<MoldChange> = records
        .iter()
        .filter(|r| r.status == ChangeStatus::Completed && r.started_at >= since)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    out
}

use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;
use rusqlite::Connection;
use std::sync::LazyLock;

/// Widest visible "operation (target)" column.
const OP_MAX_WIDTH: usize = 60;

static ANSI_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").ok());

fn strip_ansi(s: &str) -> String {
    match ANSI_RE.as_ref() {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// Restituisce il colore ANSI in base all'operazione
fn color_for_operation(op: &str) -> Colour {
    match op {
        "add" => Colour::Green,
        "claim" => Colour::Cyan,
        "del" => Colour::Red,
        "edit" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51), // arancione
        _ => Colour::White,
    }
}

/// Una riga della tabella `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// "operation (target)", oppure solo l'operazione
    fn op_target(&self) -> String {
        if self.target.is_empty() {
            self.operation.clone()
        } else {
            format!("{} ({})", self.operation, self.target)
        }
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn load_entries(conn: &Connection) -> AppResult<Vec<LogEntry>> {
        let mut stmt = conn.prepare_cached(
            "SELECT id, date, operation, target, message FROM log ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let raw_date: String = row.get(1)?;
            let date = chrono::DateTime::parse_from_rfc3339(&raw_date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or(raw_date);

            Ok(LogEntry {
                id: row.get(0)?,
                date,
                operation: row.get(2)?,
                target: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                message: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }
        Ok(entries)
    }

    pub fn print_log(pool: &mut DbPool) -> AppResult<()> {
        let entries = pool.with_conn(|conn| Self::load_entries(conn))?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let op_w = entries
            .iter()
            .map(|e| e.op_target().chars().count())
            .max()
            .unwrap_or(10)
            .min(OP_MAX_WIDTH);
        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        for e in &entries {
            let op_col = render_op_target(&e.operation, &e.op_target());
            let padding = " ".repeat(op_w.saturating_sub(strip_ansi(&op_col).chars().count()));

            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                e.id,
                e.date,
                op_col,
                padding,
                e.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}

/// Tronca a `OP_MAX_WIDTH` caratteri visibili e colora solo l'operazione.
fn render_op_target(operation: &str, op_target: &str) -> String {
    let color = color_for_operation(operation);

    let visible = if op_target.chars().count() > OP_MAX_WIDTH {
        let mut s: String = op_target.chars().take(OP_MAX_WIDTH - 3).collect();
        s.push_str("...");
        s
    } else {
        op_target.to_string()
    };

    match visible.split_once(' ') {
        Some((op_word, rest)) => format!("{} {}", color.paint(op_word), rest),
        None => color.paint(visible.as_str()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::log::ttlog;

    #[test]
    fn entries_include_migrations_and_mutations() {
        let mut pool = DbPool::in_memory().unwrap();
        pool.with_conn(|conn| ttlog(conn, "add", "12", "Added TB1 change"))
            .unwrap();

        let entries = pool.with_conn(|conn| LogLogic::load_entries(conn)).unwrap();
        assert!(entries.iter().any(|e| e.operation == "migration_applied"));
        let last = entries.last().unwrap();
        assert_eq!(last.op_target(), "add (12)");
        assert_eq!(last.message, "Added TB1 change");
    }

    #[test]
    fn long_targets_are_truncated_without_counting_ansi() {
        let long = format!("edit ({})", "x".repeat(80));
        let rendered = render_op_target("edit", &long);
        let visible = strip_ansi(&rendered);
        assert_eq!(visible.chars().count(), OP_MAX_WIDTH);
        assert!(visible.ends_with("..."));
        assert!(visible.starts_with("edit ("));
    }
}

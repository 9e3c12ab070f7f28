use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists: it also records applied migrations.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Check whether a migration has already been recorded in `log`.
fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Ordered list of schema migrations: (version, description, SQL).
const MIGRATIONS: &[(&str, &str, &str)] = &[
    (
        "20250301_0001_create_mold_changes",
        "Created mold_changes table",
        r#"
        CREATE TABLE IF NOT EXISTS mold_changes (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            line             TEXT NOT NULL CHECK (line IN ('TB1','TB2','TB3','EDF1','EDF2')),
            previous_mold_id TEXT NOT NULL DEFAULT '',
            new_mold_id      TEXT NOT NULL DEFAULT '',
            supervisor_name  TEXT NOT NULL DEFAULT '',
            shift            TEXT NOT NULL DEFAULT '',
            reason_code      TEXT NOT NULL DEFAULT '',
            started_at       TEXT NOT NULL,          -- RFC 3339, UTC
            ended_at         TEXT,                   -- NULL while open
            downtime_minutes INTEGER NOT NULL DEFAULT 0 CHECK (downtime_minutes >= 0),
            status           TEXT NOT NULL DEFAULT 'pending'
                             CHECK (status IN ('pending','in_progress','completed')),
            delay_reason     TEXT,
            notes            TEXT NOT NULL DEFAULT ''
        );
        "#,
    ),
    (
        "20250301_0002_mold_changes_indexes",
        "Added started_at/status indexes to mold_changes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_mold_changes_started ON mold_changes(started_at);
        CREATE INDEX IF NOT EXISTS idx_mold_changes_status  ON mold_changes(status);
        "#,
    ),
];

/// Public entry point: run all pending migrations.
///
/// Invocata da db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Apply, in order, whatever is missing
    for (version, message, sql) in MIGRATIONS {
        if is_applied(conn, version)? {
            continue;
        }

        conn.execute_batch(sql)?;
        mark_applied(conn, version, message)?;

        tracing::info!(version, "migration applied");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        run_pending_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM log WHERE operation = 'migration_applied'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(applied as usize, MIGRATIONS.len());
    }
}

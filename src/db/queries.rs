use crate::errors::{AppError, AppResult};
use crate::models::line::Line;
use crate::models::mold_change::{MoldChange, MoldChangePatch, NewMoldChange};
use crate::models::status::ChangeStatus;
use crate::store::Claim;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row, TransactionBehavior, params, params_from_iter};

const SELECT_CHANGES: &str = "SELECT id, line, previous_mold_id, new_mold_id, supervisor_name,
            shift, reason_code, started_at, ended_at, downtime_minutes,
            status, delay_reason, notes
     FROM mold_changes";

/// Timestamps are stored as RFC 3339 UTC text with millisecond precision,
/// so that lexical order matches chronological order.
pub fn ts_to_db(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Record ids are integers in SQLite and opaque strings everywhere else.
pub fn parse_id(id: &str) -> Option<i64> {
    id.trim().parse::<i64>().ok()
}

fn conversion_failure(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn map_row(row: &Row) -> rusqlite::Result<MoldChange> {
    let line_str: String = row.get("line")?;
    let line = Line::from_db_str(&line_str)
        .ok_or_else(|| conversion_failure(1, AppError::InvalidLine(line_str.clone())))?;

    let started_str: String = row.get("started_at")?;
    let started_at = parse_ts(&started_str)
        .ok_or_else(|| conversion_failure(7, AppError::InvalidDate(started_str.clone())))?;

    let ended_str: Option<String> = row.get("ended_at")?;
    let ended_at = match ended_str {
        Some(s) => Some(
            parse_ts(&s).ok_or_else(|| conversion_failure(8, AppError::InvalidDate(s.clone())))?,
        ),
        None => None,
    };

    let status_str: String = row.get("status")?;
    let status = ChangeStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_failure(10, AppError::InvalidStatus(status_str.clone())))?;

    Ok(MoldChange {
        id: row.get::<_, i64>("id")?.to_string(),
        line,
        previous_mold_id: row.get("previous_mold_id")?,
        new_mold_id: row.get("new_mold_id")?,
        supervisor_name: row.get("supervisor_name")?,
        shift: row.get("shift")?,
        reason_code: row.get("reason_code")?,
        started_at,
        ended_at,
        downtime_minutes: row.get("downtime_minutes")?,
        status,
        delay_reason: row.get("delay_reason")?,
        notes: row.get("notes")?,
    })
}

/// All records, most recent start first.
pub fn list_changes(conn: &Connection) -> AppResult<Vec<MoldChange>> {
    let sql = format!("{SELECT_CHANGES} ORDER BY started_at DESC, id DESC");
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn get_change(conn: &Connection, id: i64) -> AppResult<Option<MoldChange>> {
    let sql = format!("{SELECT_CHANGES} WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;

    match stmt.query_row([id], map_row) {
        Ok(mc) => Ok(Some(mc)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The most recent pending / in-progress record, if any.
pub fn find_active(conn: &Connection) -> AppResult<Option<MoldChange>> {
    let sql = format!(
        "{SELECT_CHANGES} WHERE status IN ('pending','in_progress')
         ORDER BY started_at DESC, id DESC LIMIT 1"
    );
    let mut stmt = conn.prepare_cached(&sql)?;

    match stmt.query_row([], map_row) {
        Ok(mc) => Ok(Some(mc)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_change(
    conn: &Connection,
    change: &NewMoldChange,
    now: DateTime<Utc>,
) -> AppResult<MoldChange> {
    let ch = change.clone().normalized(now);
    let started_at = ch.started_at.unwrap_or(now);

    conn.execute(
        "INSERT INTO mold_changes (line, previous_mold_id, new_mold_id, supervisor_name, shift,
                                   reason_code, started_at, ended_at, downtime_minutes, status,
                                   delay_reason, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            ch.line.to_db_str(),
            ch.previous_mold_id,
            ch.new_mold_id,
            ch.supervisor_name,
            ch.shift,
            ch.reason_code,
            ts_to_db(&started_at),
            ch.ended_at.as_ref().map(ts_to_db),
            ch.downtime_minutes,
            ch.status.to_db_str(),
            ch.delay_reason,
            ch.notes,
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_change(conn, id)?.ok_or_else(|| AppError::Other(format!("inserted row {id} vanished")))
}

/// Translate the camelCase patch into (snake_case column, value) pairs.
fn patch_columns(patch: &MoldChangePatch) -> Vec<(&'static str, Value)> {
    let mut cols: Vec<(&'static str, Value)> = Vec::new();

    if let Some(line) = patch.line {
        cols.push(("line", Value::Text(line.to_db_str().to_string())));
    }
    if let Some(v) = &patch.previous_mold_id {
        cols.push(("previous_mold_id", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.new_mold_id {
        cols.push(("new_mold_id", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.supervisor_name {
        cols.push(("supervisor_name", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.shift {
        cols.push(("shift", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.reason_code {
        cols.push(("reason_code", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.started_at {
        cols.push(("started_at", Value::Text(ts_to_db(v))));
    }
    if let Some(v) = &patch.ended_at {
        let val = match v {
            Some(dt) => Value::Text(ts_to_db(dt)),
            None => Value::Null,
        };
        cols.push(("ended_at", val));
    }
    if let Some(v) = patch.downtime_minutes {
        cols.push(("downtime_minutes", Value::Integer(i64::from(v))));
    }
    if let Some(v) = patch.status {
        cols.push(("status", Value::Text(v.to_db_str().to_string())));
    }
    if let Some(v) = &patch.delay_reason {
        let val = match v {
            Some(s) => Value::Text(s.clone()),
            None => Value::Null,
        };
        cols.push(("delay_reason", val));
    }
    if let Some(v) = &patch.notes {
        cols.push(("notes", Value::Text(v.clone())));
    }

    cols
}

/// Dynamic field-by-field update. Returns `None` when the id does not exist.
///
/// The patch is merged against the stored row inside one IMMEDIATE
/// transaction, so status and `ended_at` cannot drift apart.
pub fn update_change(
    conn: &mut Connection,
    id: i64,
    patch: &MoldChangePatch,
    now: DateTime<Utc>,
) -> AppResult<Option<MoldChange>> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("no fields to update".into()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let Some(current) = get_change(&tx, id)? else {
        return Ok(None);
    };

    let patch = patch.clone().settled(&current, now)?;
    let cols = patch_columns(&patch);

    let set_clause = cols
        .iter()
        .enumerate()
        .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE mold_changes SET {set_clause} WHERE id = ?{}",
        cols.len() + 1
    );

    let mut values: Vec<Value> = cols.into_iter().map(|(_, v)| v).collect();
    values.push(Value::Integer(id));

    tx.execute(&sql, params_from_iter(values))?;
    let updated = get_change(&tx, id)?;
    tx.commit()?;
    Ok(updated)
}

/// Hard delete. Returns false when nothing matched.
pub fn delete_change(conn: &Connection, id: i64) -> AppResult<bool> {
    let affected = conn.execute("DELETE FROM mold_changes WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

/// Create a pending record only if no other record is active.
///
/// Runs in an IMMEDIATE transaction, so two writers cannot both observe
/// "no active record" and insert.
pub fn claim_change(
    conn: &mut Connection,
    change: &NewMoldChange,
    now: DateTime<Utc>,
) -> AppResult<Claim> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if let Some(active) = find_active(&tx)? {
        tx.commit()?;
        return Ok(Claim::Existing(active));
    }

    let mut pending = change.clone();
    if !pending.status.is_active() {
        pending.status = ChangeStatus::Pending;
    }
    let created = insert_change(&tx, &pending, now)?;
    tx.commit()?;

    Ok(Claim::Created(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::DbPool;
    use chrono::{Duration, TimeZone};

    fn sample(line: Line) -> NewMoldChange {
        NewMoldChange {
            line,
            previous_mold_id: "M-1".into(),
            new_mold_id: "M-2".into(),
            supervisor_name: "Carlos Ramirez".into(),
            shift: "Primer turno".into(),
            reason_code: "Cambio de producto".into(),
            started_at: None,
            ended_at: None,
            downtime_minutes: 0,
            status: ChangeStatus::Pending,
            delay_reason: None,
            notes: String::new(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn insert_then_list_round_trips_fields() {
        let pool = DbPool::in_memory().unwrap();
        let created = insert_change(&pool.conn, &sample(Line::Tb1), t0()).unwrap();

        let all = list_changes(&pool.conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], created);
        assert_eq!(all[0].previous_mold_id, "M-1");
        assert_eq!(all[0].started_at, t0());
        assert_eq!(all[0].ended_at, None);
    }

    #[test]
    fn list_is_ordered_by_start_desc() {
        let pool = DbPool::in_memory().unwrap();
        let mut older = sample(Line::Tb1);
        older.started_at = Some(t0() - Duration::hours(3));
        insert_change(&pool.conn, &older, t0()).unwrap();
        insert_change(&pool.conn, &sample(Line::Edf1), t0()).unwrap();

        let all = list_changes(&pool.conn).unwrap();
        assert_eq!(all[0].line, Line::Edf1);
        assert_eq!(all[1].line, Line::Tb1);
    }

    #[test]
    fn update_applies_only_given_fields() {
        let mut pool = DbPool::in_memory().unwrap();
        let created = insert_change(&pool.conn, &sample(Line::Tb2), t0()).unwrap();
        let id = parse_id(&created.id).unwrap();

        let end = t0() + Duration::minutes(46);
        let patch = MoldChangePatch::completion(end, 46);
        let updated = update_change(&mut pool.conn, id, &patch, end).unwrap().unwrap();

        assert_eq!(updated.status, ChangeStatus::Completed);
        assert_eq!(updated.ended_at, Some(end));
        assert_eq!(updated.downtime_minutes, 46);
        assert_eq!(updated.supervisor_name, "Carlos Ramirez");
    }

    #[test]
    fn update_missing_id_returns_none_and_empty_patch_is_rejected() {
        let mut pool = DbPool::in_memory().unwrap();
        let patch = MoldChangePatch {
            notes: Some("x".into()),
            ..Default::default()
        };
        assert!(update_change(&mut pool.conn, 999, &patch, t0()).unwrap().is_none());

        let err = update_change(&mut pool.conn, 1, &MoldChangePatch::default(), t0()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn end_time_follows_the_resulting_status() {
        let mut pool = DbPool::in_memory().unwrap();
        let created = insert_change(&pool.conn, &sample(Line::Tb1), t0()).unwrap();
        let id = parse_id(&created.id).unwrap();
        let end = t0() + Duration::minutes(5);

        let end_only = MoldChangePatch {
            ended_at: Some(Some(end)),
            ..Default::default()
        };
        let err = update_change(&mut pool.conn, id, &end_only, end).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(get_change(&pool.conn, id).unwrap().unwrap().ended_at, None);

        let done = MoldChangePatch::completion(end, 5);
        update_change(&mut pool.conn, id, &done, end).unwrap().unwrap();

        let clear_end = MoldChangePatch {
            ended_at: Some(None),
            ..Default::default()
        };
        let err = update_change(&mut pool.conn, id, &clear_end, end).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(get_change(&pool.conn, id).unwrap().unwrap().ended_at, Some(end));
    }

    #[test]
    fn reopening_a_completed_change_resets_downtime() {
        let mut pool = DbPool::in_memory().unwrap();
        let created = insert_change(&pool.conn, &sample(Line::Edf2), t0()).unwrap();
        let id = parse_id(&created.id).unwrap();
        let end = t0() + Duration::minutes(5);
        update_change(&mut pool.conn, id, &MoldChangePatch::completion(end, 5), end).unwrap();

        let reopen = MoldChangePatch {
            status: Some(ChangeStatus::Pending),
            ..Default::default()
        };
        let rec = update_change(&mut pool.conn, id, &reopen, end).unwrap().unwrap();
        assert_eq!(rec.status, ChangeStatus::Pending);
        assert_eq!(rec.ended_at, None);
        assert_eq!(rec.downtime_minutes, 0);
    }

    #[test]
    fn delete_reports_missing_rows() {
        let pool = DbPool::in_memory().unwrap();
        let created = insert_change(&pool.conn, &sample(Line::Tb3), t0()).unwrap();
        let id = parse_id(&created.id).unwrap();
        assert!(delete_change(&pool.conn, id).unwrap());
        assert!(!delete_change(&pool.conn, id).unwrap());
    }

    #[test]
    fn claim_yields_existing_active_record() {
        let mut pool = DbPool::in_memory().unwrap();
        let first = match claim_change(&mut pool.conn, &sample(Line::Tb1), t0()).unwrap() {
            Claim::Created(rec) => rec,
            Claim::Existing(_) => panic!("nothing was active yet"),
        };

        match claim_change(&mut pool.conn, &sample(Line::Tb2), t0()).unwrap() {
            Claim::Existing(rec) => assert_eq!(rec.id, first.id),
            Claim::Created(_) => panic!("second claim must not create"),
        }
        assert_eq!(list_changes(&pool.conn).unwrap().len(), 1);
    }
}

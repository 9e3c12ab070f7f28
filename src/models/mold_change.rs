use super::{line::Line, status::ChangeStatus};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reasons offered to the operator when a change starts.
pub const CHANGE_REASONS: [&str; 6] = [
    "Cambio de producto",
    "Mantenimiento preventivo",
    "Desgaste del molde",
    "Defectos de calidad",
    "Programacion de produccion",
    "Otro",
];

/// Reasons accepted when a change runs past the target.
pub const DELAY_REASONS: [&str; 8] = [
    "Cambio de fierro a fierro",
    "Liberación de pieza",
    "Falla mecánica",
    "Falla eléctrica",
    "Ajuste de proceso",
    "Limpieza de moldes",
    "Falta de personal",
    "Otro",
];

/// Catch-all reason: requires a free-text description.
pub const OTHER_REASON: &str = "Otro";

/// One mold-change event, as seen at the interface boundary (camelCase JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoldChange {
    pub id: String,                        // ⇔ mold_changes.id (INTEGER, rendered as text)
    pub line: Line,                        // ⇔ mold_changes.line ('TB1' … 'EDF2')
    pub previous_mold_id: String,          // ⇔ mold_changes.previous_mold_id
    pub new_mold_id: String,               // ⇔ mold_changes.new_mold_id
    pub supervisor_name: String,           // ⇔ mold_changes.supervisor_name
    pub shift: String,                     // ⇔ mold_changes.shift
    pub reason_code: String,               // ⇔ mold_changes.reason_code
    pub started_at: DateTime<Utc>,         // ⇔ mold_changes.started_at (RFC 3339)
    pub ended_at: Option<DateTime<Utc>>,   // ⇔ mold_changes.ended_at (NULL while open)
    pub downtime_minutes: u32,             // ⇔ mold_changes.downtime_minutes
    pub status: ChangeStatus,              // ⇔ mold_changes.status
    #[serde(default)]
    pub delay_reason: Option<String>,      // ⇔ mold_changes.delay_reason
    #[serde(default)]
    pub notes: String,                     // ⇔ mold_changes.notes
}

impl MoldChange {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn started_local(&self) -> DateTime<Local> {
        self.started_at.with_timezone(&Local)
    }

    /// Seconds elapsed since the record started, never negative.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }
}

fn default_status() -> ChangeStatus {
    ChangeStatus::Pending
}

/// Body of a create request: every record field except the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMoldChange {
    pub line: Line,
    #[serde(default)]
    pub previous_mold_id: String,
    #[serde(default)]
    pub new_mold_id: String,
    #[serde(default)]
    pub supervisor_name: String,
    #[serde(default)]
    pub shift: String,
    #[serde(default)]
    pub reason_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub downtime_minutes: u32,
    #[serde(default = "default_status")]
    pub status: ChangeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_reason: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewMoldChange {
    /// Enforce the record invariants before the row is written:
    /// `startedAt` defaults to `now`, `endedAt` is set iff completed.
    pub fn normalized(mut self, now: DateTime<Utc>) -> Self {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if self.status.is_completed() {
            if self.ended_at.is_none() {
                self.ended_at = Some(now);
            }
        } else {
            self.ended_at = None;
            self.downtime_minutes = 0;
        }
        self
    }
}

/// Deserialize a field that may be absent (outer None) or explicitly null.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update: only the fields present are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoldChangePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_mold_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_mold_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay_reason: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MoldChangePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The update issued by "complete by id": status, end time and downtime.
    pub fn completion(now: DateTime<Utc>, downtime_minutes: u32) -> Self {
        Self {
            status: Some(ChangeStatus::Completed),
            ended_at: Some(Some(now)),
            downtime_minutes: Some(downtime_minutes),
            ..Self::default()
        }
    }

    /// Merge against the stored record so that `endedAt` stays set exactly
    /// when the resulting status is completed.
    ///
    /// A completing patch without an end time gets `now`; reopening a
    /// completed record clears the end time and the downtime. An explicit
    /// end time on an open record, or a null one on a completed record,
    /// is rejected.
    pub fn settled(mut self, current: &MoldChange, now: DateTime<Utc>) -> AppResult<Self> {
        let status = self.status.unwrap_or(current.status);

        if status.is_completed() {
            match self.ended_at {
                Some(Some(_)) => {}
                Some(None) => {
                    return Err(AppError::BadRequest(
                        "endedAt cannot be null on a completed change".into(),
                    ));
                }
                None if current.ended_at.is_none() => self.ended_at = Some(Some(now)),
                None => {}
            }
            return Ok(self);
        }

        if matches!(self.ended_at, Some(Some(_))) {
            return Err(AppError::BadRequest(format!(
                "endedAt requires status completed, not {status}"
            )));
        }
        if current.status.is_completed() {
            self.ended_at = Some(None);
            self.downtime_minutes = Some(0);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn patch_distinguishes_absent_and_null() {
        let p: MoldChangePatch = serde_json::from_str(r#"{"endedAt": null}"#).unwrap();
        assert_eq!(p.ended_at, Some(None));
        assert!(!p.is_empty());

        let p: MoldChangePatch = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.ended_at, None);
        assert!(p.is_empty());
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let res = serde_json::from_str::<MoldChangePatch>(r#"{"id": "7"}"#);
        assert!(res.is_err());
    }

    fn stored(status: ChangeStatus) -> MoldChange {
        let start = Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap();
        let done = status.is_completed();
        MoldChange {
            id: "4".into(),
            line: Line::Tb1,
            previous_mold_id: "M-1".into(),
            new_mold_id: "M-2".into(),
            supervisor_name: "Ana".into(),
            shift: "Primer turno".into(),
            reason_code: "Cambio de producto".into(),
            started_at: start,
            ended_at: done.then_some(start + chrono::Duration::minutes(5)),
            downtime_minutes: if done { 5 } else { 0 },
            status,
            delay_reason: None,
            notes: String::new(),
        }
    }

    #[test]
    fn completing_patch_gets_an_end_time() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();
        let p = MoldChangePatch {
            status: Some(ChangeStatus::Completed),
            ..Default::default()
        }
        .settled(&stored(ChangeStatus::Pending), now)
        .unwrap();
        assert_eq!(p.ended_at, Some(Some(now)));
    }

    #[test]
    fn reopening_clears_end_time_and_downtime() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();
        let p = MoldChangePatch {
            status: Some(ChangeStatus::Pending),
            ..Default::default()
        }
        .settled(&stored(ChangeStatus::Completed), now)
        .unwrap();
        assert_eq!(p.ended_at, Some(None));
        assert_eq!(p.downtime_minutes, Some(0));
    }

    #[test]
    fn end_time_must_match_resulting_status() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();

        let end_on_open = MoldChangePatch {
            ended_at: Some(Some(now)),
            ..Default::default()
        };
        let err = end_on_open.settled(&stored(ChangeStatus::Pending), now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let null_on_done = MoldChangePatch {
            ended_at: Some(None),
            ..Default::default()
        };
        let err = null_on_done.settled(&stored(ChangeStatus::Completed), now).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let moved_end = MoldChangePatch {
            ended_at: Some(Some(now)),
            ..Default::default()
        };
        assert!(moved_end.settled(&stored(ChangeStatus::Completed), now).is_ok());
    }

    #[test]
    fn new_change_defaults_start_and_clears_end_when_open() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();
        let raw = r#"{"line":"TB2","previousMoldId":"M-1","newMoldId":"M-2",
                      "endedAt":"2025-05-02T11:00:00Z","downtimeMinutes":9}"#;
        let n: NewMoldChange = serde_json::from_str(raw).unwrap();
        let n = n.normalized(now);
        assert_eq!(n.status, ChangeStatus::Pending);
        assert_eq!(n.started_at, Some(now));
        assert_eq!(n.ended_at, None);
        assert_eq!(n.downtime_minutes, 0);
    }

    #[test]
    fn record_serializes_camel_case() {
        let rec = MoldChange {
            id: "1".into(),
            line: Line::Tb1,
            previous_mold_id: "M-1".into(),
            new_mold_id: "M-2".into(),
            supervisor_name: "Ana".into(),
            shift: "Primer turno".into(),
            reason_code: "Cambio de producto".into(),
            started_at: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            ended_at: None,
            downtime_minutes: 0,
            status: ChangeStatus::InProgress,
            delay_reason: None,
            notes: String::new(),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["previousMoldId"], "M-1");
        assert_eq!(v["status"], "in_progress");
        assert!(v["endedAt"].is_null());
        assert!(v["delayReason"].is_null());
        assert!(v.as_object().unwrap().contains_key("delayReason"));
    }
}

// src/export/model.rs

use crate::models::mold_change::MoldChange;
use crate::models::status::ChangeStatus;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

/// Formato data/ora usato in tutti gli export (ora locale).
pub(crate) const EXPORT_DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Riga "piatta" di export di un cambio molde.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MoldChangeExport {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Línea")]
    pub line: String,
    #[serde(rename = "Molde Anterior")]
    pub previous_mold: String,
    #[serde(rename = "Molde Nuevo")]
    pub new_mold: String,
    #[serde(rename = "Supervisor")]
    pub supervisor: String,
    #[serde(rename = "Turno")]
    pub shift: String,
    #[serde(rename = "Motivo Cambio")]
    pub reason: String,
    #[serde(rename = "Fecha Inicio")]
    pub started: String,
    #[serde(rename = "Fecha Fin")]
    pub ended: String,
    #[serde(rename = "Tiempo Muerto (min)")]
    pub downtime_minutes: u32,
    #[serde(rename = "Estado")]
    pub status: String,
    #[serde(rename = "Motivo Retraso")]
    pub delay_reason: String,
    #[serde(rename = "Observaciones")]
    pub notes: String,
}

fn local_str(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(EXPORT_DT_FMT).to_string()
}

pub(crate) fn status_label(status: ChangeStatus) -> &'static str {
    match status {
        ChangeStatus::Pending => "Pendiente",
        ChangeStatus::InProgress => "En proceso",
        ChangeStatus::Completed => "Completado",
    }
}

impl From<&MoldChange> for MoldChangeExport {
    fn from(r: &MoldChange) -> Self {
        Self {
            id: r.id.clone(),
            line: r.line.code().to_string(),
            previous_mold: r.previous_mold_id.clone(),
            new_mold: r.new_mold_id.clone(),
            supervisor: r.supervisor_name.clone(),
            shift: r.shift.clone(),
            reason: r.reason_code.clone(),
            started: local_str(r.started_at),
            ended: r.ended_at.map(local_str).unwrap_or_else(|| "-".into()),
            downtime_minutes: r.downtime_minutes,
            status: status_label(r.status).to_string(),
            delay_reason: r
                .delay_reason
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "-".into()),
            notes: r.notes.clone(),
        }
    }
}

/// Intestazioni nello stesso ordine dei campi serializzati.
pub(crate) const HEADERS: [&str; 13] = [
    "ID",
    "Línea",
    "Molde Anterior",
    "Molde Nuevo",
    "Supervisor",
    "Turno",
    "Motivo Cambio",
    "Fecha Inicio",
    "Fecha Fin",
    "Tiempo Muerto (min)",
    "Estado",
    "Motivo Retraso",
    "Observaciones",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::line::Line;
    use chrono::TimeZone;

    fn open_change() -> MoldChange {
        MoldChange {
            id: "7".into(),
            line: Line::Edf2,
            previous_mold_id: "M-10".into(),
            new_mold_id: "M-11".into(),
            supervisor_name: "Ana".into(),
            shift: "Primer turno".into(),
            reason_code: "Desgaste del molde".into(),
            started_at: Utc.with_ymd_and_hms(2025, 3, 4, 8, 0, 0).unwrap(),
            ended_at: None,
            downtime_minutes: 0,
            status: ChangeStatus::InProgress,
            delay_reason: None,
            notes: "PENDIENTE | En curso...".into(),
        }
    }

    #[test]
    fn open_record_uses_dash_placeholders() {
        let row = MoldChangeExport::from(&open_change());
        assert_eq!(row.ended, "-");
        assert_eq!(row.delay_reason, "-");
        assert_eq!(row.status, "En proceso");
        assert_eq!(row.line, "EDF2");
    }

    #[test]
    fn csv_header_follows_headers_order() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(MoldChangeExport::from(&open_change())).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out.lines().next().unwrap(), HEADERS.join(","));
    }
}

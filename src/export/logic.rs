// src/export/logic.rs

use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::MoldChangeExport;
use crate::export::range::parse_range;
use crate::export::xlsx::export_xlsx;
use crate::models::mold_change::MoldChange;
use crate::ui::messages::warning;
use chrono::NaiveDate;
use std::path::Path;

/// Filtri applicati prima dell'export.
#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    /// `None`, `"all"` oppure un'espressione `--range` (vedi `parse_range`).
    pub range: Option<String>,
    /// Solo i cambi completati.
    pub completed_only: bool,
}

/// Logica di alto livello per l'export.
pub struct ExportLogic;

impl ExportLogic {
    /// Export dei cambi molde.
    ///
    /// - `format`: csv | json | xlsx
    /// - `file`: path assoluto del file di output
    /// - `force`: sovrascrive senza chiedere conferma
    ///
    /// Restituisce il numero di righe scritte (0 = nessun file creato).
    pub fn export(
        records: &[MoldChange],
        format: ExportFormat,
        file: &str,
        filter: &ExportFilter,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "Output file path must be absolute: {file}"
            )));
        }

        let rows = select_rows(records, filter)?;

        if rows.is_empty() {
            warning("⚠️  No mold changes found for the selected filters.");
            return Ok(0);
        }

        ensure_writable(path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
            ExportFormat::Xlsx => export_xlsx(&rows, path)?,
        }

        Ok(rows.len())
    }
}

/// Applica i filtri e ordina per data di inizio crescente.
pub(crate) fn select_rows(
    records: &[MoldChange],
    filter: &ExportFilter,
) -> AppResult<Vec<MoldChangeExport>> {
    let bounds: Option<(NaiveDate, NaiveDate)> = match filter.range.as_deref() {
        None => None,
        Some(r) if r.eq_ignore_ascii_case("all") => None,
        Some(r) => Some(parse_range(r)?),
    };

    let mut selected: Vec<&MoldChange> = records
        .iter()
        .filter(|r| !filter.completed_only || r.status.is_completed())
        .filter(|r| match bounds {
            None => true,
            Some((from, to)) => {
                let day = r.started_local().date_naive();
                day >= from && day <= to
            }
        })
        .collect();

    selected.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));

    Ok(selected.into_iter().map(MoldChangeExport::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::line::Line;
    use crate::models::status::ChangeStatus;
    use chrono::{Duration, Local, TimeZone, Utc};

    fn rec(id: &str, status: ChangeStatus, days_ago: i64) -> MoldChange {
        let base = Local
            .with_ymd_and_hms(2025, 5, 20, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        MoldChange {
            id: id.into(),
            line: Line::Tb1,
            previous_mold_id: "A".into(),
            new_mold_id: "B".into(),
            supervisor_name: "S".into(),
            shift: "Primer turno".into(),
            reason_code: "Cambio de producto".into(),
            started_at: base - Duration::days(days_ago),
            ended_at: status.is_completed().then_some(base),
            downtime_minutes: if status.is_completed() { 30 } else { 0 },
            status,
            delay_reason: None,
            notes: String::new(),
        }
    }

    fn sample() -> Vec<MoldChange> {
        vec![
            rec("3", ChangeStatus::InProgress, 0),
            rec("2", ChangeStatus::Completed, 1),
            rec("1", ChangeStatus::Completed, 40),
        ]
    }

    #[test]
    fn rows_are_oldest_first() {
        let rows = select_rows(&sample(), &ExportFilter::default()).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn completed_only_and_range_filters() {
        let filter = ExportFilter {
            range: Some("2025-05".into()),
            completed_only: true,
        };
        let rows = select_rows(&sample(), &filter).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn relative_path_is_rejected() {
        let err = ExportLogic::export(
            &sample(),
            ExportFormat::Csv,
            "out.csv",
            &ExportFilter::default(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Export(_)));
    }

    #[test]
    fn writes_csv_with_spanish_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.csv");
        let written = ExportLogic::export(
            &sample(),
            ExportFormat::Csv,
            path.to_str().unwrap(),
            &ExportFilter::default(),
            true,
        )
        .unwrap();
        assert_eq!(written, 3);

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("ID,Línea,Molde Anterior,Molde Nuevo"));
        assert!(header.ends_with("Estado,Motivo Retraso,Observaciones"));
    }
}

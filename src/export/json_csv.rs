// src/export/json_csv.rs

use crate::errors::{AppError, AppResult};
use crate::export::{ExportFormat, MoldChangeExport, notify_export_success};
use crate::ui::messages::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn export_err(format: ExportFormat, e: impl std::fmt::Display) -> AppError {
    AppError::Export(format!("{}: {e}", format.label()))
}

/// JSON: array di oggetti con le chiavi spagnole, indentato.
pub(crate) fn export_json(rows: &[MoldChangeExport], path: &Path) -> AppResult<()> {
    info(format!("Exporting to JSON: {}", path.display()));

    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, rows).map_err(|e| export_err(ExportFormat::Json, e))?;
    out.write_all(b"\n")?;
    out.flush()?;

    notify_export_success(ExportFormat::Json, path);
    Ok(())
}

/// CSV: intestazione dai `serde(rename)` del modello.
pub(crate) fn export_csv(rows: &[MoldChangeExport], path: &Path) -> AppResult<()> {
    info(format!("Exporting to CSV: {}", path.display()));

    let mut wtr = csv::Writer::from_path(path).map_err(|e| export_err(ExportFormat::Csv, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| export_err(ExportFormat::Csv, e))?;
    }
    wtr.flush()?;

    notify_export_success(ExportFormat::Csv, path);
    Ok(())
}

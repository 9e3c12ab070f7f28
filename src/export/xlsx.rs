// src/export/xlsx.rs

use crate::errors::{AppError, AppResult};
use crate::export::excel_date::{EXCEL_DT_FORMAT, excel_serial};
use crate::export::model::{HEADERS, status_label};
use crate::export::{ExportFormat, MoldChangeExport, notify_export_success};
use crate::models::status::ChangeStatus;
use crate::ui::messages::info;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

const SHEET_NAME: &str = "Cambios de Molde";
const MAX_COL_WIDTH: usize = 60;

const HEADER_BG: u32 = 0x2F75B5;
const BAND_BG: u32 = 0xEAF3FB;
const PLAIN_BG: u32 = 0xFFFFFF;
const DONE_BG: u32 = 0xE2EFDA;
const OPEN_BG: u32 = 0xFFF2CC;
const LATE_FG: u32 = 0xC00000;

/// Una cella tipizzata: niente più indovinare il tipo dalla stringa.
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    DateTime(&'a str),
    Status(&'a str),
    Downtime { minutes: u32, late: bool },
}

fn cells(r: &MoldChangeExport) -> [Cell<'_>; HEADERS.len()] {
    // un motivo di ritardo esiste solo fuori meta
    let late = r.delay_reason != "-";
    [
        r.id.parse::<f64>()
            .map(Cell::Number)
            .unwrap_or(Cell::Text(&r.id)),
        Cell::Text(&r.line),
        Cell::Text(&r.previous_mold),
        Cell::Text(&r.new_mold),
        Cell::Text(&r.supervisor),
        Cell::Text(&r.shift),
        Cell::Text(&r.reason),
        Cell::DateTime(&r.started),
        Cell::DateTime(&r.ended),
        Cell::Downtime {
            minutes: r.downtime_minutes,
            late,
        },
        Cell::Status(&r.status),
        Cell::Text(&r.delay_reason),
        Cell::Text(&r.notes),
    ]
}

fn boxed(bg: u32) -> Format {
    Format::new()
        .set_background_color(Color::RGB(bg))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin)
}

fn xlsx_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Export(format!("XLSX: {e}"))
}

/// Export XLSX: un foglio, intestazione bloccata con filtro, righe a bande.
pub(crate) fn export_xlsx(rows: &[MoldChangeExport], path: &Path) -> AppResult<()> {
    info(format!("Exporting to XLSX: {}", path.display()));

    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name(SHEET_NAME).map_err(xlsx_err)?;

    // 1️⃣ intestazione
    let header_fmt = boxed(HEADER_BG)
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_align(FormatAlign::Center);

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.width()).collect();
    for (col, header) in HEADERS.iter().enumerate() {
        ws.write_with_format(0, col as u16, *header, &header_fmt)
            .map_err(xlsx_err)?;
    }

    // 2️⃣ righe
    for (i, rec) in rows.iter().enumerate() {
        let bg = if i % 2 == 0 { BAND_BG } else { PLAIN_BG };
        for (col, cell) in cells(rec).iter().enumerate() {
            let w = write_cell(ws, (i + 1) as u32, col as u16, cell, bg)?;
            widths[col] = widths[col].max(w);
        }
    }

    // 3️⃣ rifiniture
    ws.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    ws.autofilter(0, 0, rows.len() as u32, (HEADERS.len() - 1) as u16)
        .map_err(xlsx_err)?;
    for (col, w) in widths.iter().enumerate() {
        ws.set_column_width(col as u16, (*w).min(MAX_COL_WIDTH) as f64 + 2.0)
            .map_err(xlsx_err)?;
    }

    workbook.save(path).map_err(xlsx_err)?;

    notify_export_success(ExportFormat::Xlsx, path);
    Ok(())
}

/// Scrive una cella e restituisce la larghezza visuale del contenuto.
fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell<'_>, bg: u32) -> AppResult<usize> {
    match *cell {
        Cell::Text(s) => {
            ws.write_with_format(row, col, s, &boxed(bg))
                .map_err(xlsx_err)?;
            Ok(s.width())
        }
        Cell::Number(n) => {
            let fmt = boxed(bg).set_align(FormatAlign::Right);
            ws.write_with_format(row, col, n, &fmt).map_err(xlsx_err)?;
            Ok(n.to_string().len())
        }
        Cell::DateTime(s) => match excel_serial(s) {
            Some(serial) => {
                let fmt = boxed(bg).set_num_format(EXCEL_DT_FORMAT);
                ws.write_with_format(row, col, serial, &fmt)
                    .map_err(xlsx_err)?;
                Ok(s.width())
            }
            // cambio ancora aperto: "-"
            None => {
                let fmt = boxed(bg).set_align(FormatAlign::Center);
                ws.write_with_format(row, col, s, &fmt).map_err(xlsx_err)?;
                Ok(s.width())
            }
        },
        Cell::Downtime { minutes, late } => {
            let mut fmt = boxed(bg).set_align(FormatAlign::Right);
            if late {
                fmt = fmt.set_bold().set_font_color(Color::RGB(LATE_FG));
            }
            ws.write_with_format(row, col, f64::from(minutes), &fmt)
                .map_err(xlsx_err)?;
            Ok(minutes.to_string().len())
        }
        Cell::Status(s) => {
            let fill = if s == status_label(ChangeStatus::Completed) {
                DONE_BG
            } else {
                OPEN_BG
            };
            let fmt = boxed(fill).set_align(FormatAlign::Center);
            ws.write_with_format(row, col, s, &fmt).map_err(xlsx_err)?;
            Ok(s.width())
        }
    }
}

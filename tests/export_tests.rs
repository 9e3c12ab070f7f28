mod common;

use common::{add_completed, init_db, rmt, temp_out};
use predicates::str::contains;
use std::fs;

/// DB with two completed changes and one still open.
fn init_db_with_data(name: &str) -> String {
    let db_path = init_db(name);
    add_completed(name, &db_path, "TB1", "A-1", "A-2", "20");
    add_completed(name, &db_path, "TB2", "B-1", "B-2", "35");
    rmt(name)
        .args([
            "--db", &db_path, "add", "EDF1", "--prev", "E-1", "--new", "E-2", "--supervisor",
            "Luis",
        ])
        .assert()
        .success();
    db_path
}

#[test]
fn test_export_csv_has_spanish_headers() {
    let name = "export_csv_headers";
    let db_path = init_db_with_data(name);
    let out = temp_out(name, "csv");

    rmt(name)
        .args(["--db", &db_path, "export", "--format", "csv", "--file", &out])
        .assert()
        .success()
        .stdout(contains("CSV export completed"));

    let content = fs::read_to_string(&out).expect("read csv");
    let header = content.lines().next().unwrap_or_default();
    assert!(header.starts_with("ID,Línea,Molde Anterior,Molde Nuevo"));
    assert!(header.contains("Tiempo Muerto (min)"));
    assert!(header.ends_with("Observaciones"));

    // 3 righe + intestazione
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("En proceso") || content.contains("Pendiente"));
}

#[test]
fn test_export_json_completed_only() {
    let name = "export_json_completed";
    let db_path = init_db_with_data(name);
    let out = temp_out(name, "json");

    rmt(name)
        .args([
            "--db",
            &db_path,
            "export",
            "--format",
            "json",
            "--file",
            &out,
            "--completed",
        ])
        .assert()
        .success();

    let content = fs::read_to_string(&out).expect("read json");
    let rows: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let rows = rows.as_array().expect("json array");
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert_eq!(row["Estado"], "Completado");
        assert_ne!(row["Fecha Fin"], "-");
    }
    // ordinati per inizio: il cambio da 35 min è partito prima
    assert_eq!(rows[0]["Molde Anterior"], "B-1");
    assert_eq!(rows[0]["Tiempo Muerto (min)"], 35);
    assert_eq!(rows[1]["Molde Anterior"], "A-1");
}

#[test]
fn test_export_xlsx_creates_workbook() {
    let name = "export_xlsx_workbook";
    let db_path = init_db_with_data(name);
    let out = temp_out(name, "xlsx");

    rmt(name)
        .args(["--db", &db_path, "export", "--format", "xlsx", "--file", &out])
        .assert()
        .success()
        .stdout(contains("XLSX export completed"));

    let bytes = fs::read(&out).expect("read xlsx");
    // xlsx is a zip container
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn test_export_requires_absolute_path() {
    let name = "export_relative_path";
    let db_path = init_db_with_data(name);

    rmt(name)
        .args(["--db", &db_path, "export", "--file", "relative.csv"])
        .assert()
        .failure()
        .stderr(contains("must be absolute"));
}

#[test]
fn test_export_empty_selection_writes_nothing() {
    let name = "export_empty_selection";
    let db_path = init_db(name);
    let out = temp_out(name, "csv");

    rmt(name)
        .args(["--db", &db_path, "export", "--file", &out])
        .assert()
        .success()
        .stdout(contains("No mold changes found"));

    assert!(!std::path::Path::new(&out).exists());
}

#[test]
fn test_export_force_overwrites() {
    let name = "export_force_overwrite";
    let db_path = init_db_with_data(name);
    let out = temp_out(name, "csv");
    fs::write(&out, "old content").expect("seed file");

    rmt(name)
        .args(["--db", &db_path, "export", "--file", &out, "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(&out).expect("read csv");
    assert!(content.starts_with("ID,"));
}

#[test]
fn test_export_bad_range_fails() {
    let name = "export_bad_range";
    let db_path = init_db_with_data(name);
    let out = temp_out(name, "csv");

    rmt(name)
        .args(["--db", &db_path, "export", "--file", &out, "--range", "2025-13"])
        .assert()
        .failure()
        .stderr(contains("Invalid date format"));
}

#[test]
fn test_export_format_follows_extension() {
    let name = "export_format_extension";
    let db_path = init_db_with_data(name);
    let out = temp_out(name, "json");

    rmt(name)
        .args(["--db", &db_path, "export", "--file", &out])
        .assert()
        .success()
        .stdout(contains("JSON export completed"));

    let content = fs::read_to_string(&out).expect("read json");
    assert!(content.trim_start().starts_with('['));
}

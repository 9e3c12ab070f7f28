mod common;

use common::{add_completed, init_db, rmt, setup_test_db};
use predicates::str::contains;

#[test]
fn test_init_creates_database() {
    let name = "init_creates_database";
    let db_path = setup_test_db(name);

    rmt(name)
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));

    assert!(std::path::Path::new(&db_path).exists());
}

#[test]
fn test_add_open_change_blocks_a_second_one() {
    let name = "add_open_blocks_second";
    let db_path = init_db(name);

    rmt(name)
        .args([
            "--db", &db_path, "add", "tb1", "--prev", "M-10", "--new", "M-11", "--supervisor",
            "Raquel",
        ])
        .assert()
        .success()
        .stdout(contains("Change #1 started on TB1"));

    // un solo cambio attivo alla volta, anche su un'altra linea
    rmt(name)
        .args([
            "--db", &db_path, "add", "edf2", "--prev", "D-1", "--new", "D-2", "--supervisor",
            "Luis",
        ])
        .assert()
        .failure()
        .stderr(contains("already active: 1"));

    rmt(name)
        .args(["--db", &db_path, "list", "--status", "pending"])
        .assert()
        .success()
        .stdout(contains("M-10 → M-11"))
        .stdout(contains("1 change(s)"));
}

#[test]
fn test_add_with_minutes_records_completed_change() {
    let name = "add_with_minutes";
    let db_path = init_db(name);

    add_completed(name, &db_path, "TB2", "A-1", "A-2", "30");

    rmt(name)
        .args(["--db", &db_path, "list", "--line", "tb2"])
        .assert()
        .success()
        .stdout(contains("30 min"))
        .stdout(contains("completed"));

    // over target without a delay reason
    rmt(name)
        .args([
            "--db", &db_path, "add", "TB3", "--prev", "B-1", "--new", "B-2", "--supervisor",
            "Ana", "--minutes", "60",
        ])
        .assert()
        .failure()
        .stderr(contains("delay reason is required"));

    // "Otro" needs a description
    rmt(name)
        .args([
            "--db",
            &db_path,
            "add",
            "TB3",
            "--prev",
            "B-1",
            "--new",
            "B-2",
            "--supervisor",
            "Ana",
            "--minutes",
            "60",
            "--delay-reason",
            "Otro",
        ])
        .assert()
        .failure()
        .stderr(contains("requires a description"));

    rmt(name)
        .args([
            "--db",
            &db_path,
            "add",
            "TB3",
            "--prev",
            "B-1",
            "--new",
            "B-2",
            "--supervisor",
            "Ana",
            "--minutes",
            "60",
            "--delay-reason",
            " Otro ",
        ])
        .assert()
        .failure()
        .stderr(contains("requires a description"));

    rmt(name)
        .args([
            "--db",
            &db_path,
            "add",
            "TB3",
            "--prev",
            "B-1",
            "--new",
            "B-2",
            "--supervisor",
            "Ana",
            "--minutes",
            "60",
            "--delay-reason",
            "Otro",
            "--desc",
            "Grúa ocupada",
        ])
        .assert()
        .success()
        .stdout(contains("Fuera de meta"));
}

#[test]
fn test_add_rejects_unknown_line() {
    let name = "add_unknown_line";
    let db_path = init_db(name);

    rmt(name)
        .args([
            "--db", &db_path, "add", "XX9", "--prev", "A", "--new", "B", "--supervisor", "S",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid production line: XX9"));
}

#[test]
fn test_complete_open_change() {
    let name = "complete_open_change";
    let db_path = init_db(name);

    rmt(name)
        .args([
            "--db", &db_path, "add", "EDF1", "--prev", "E-5", "--new", "E-6", "--supervisor",
            "Pablo",
        ])
        .assert()
        .success();

    rmt(name)
        .args(["--db", &db_path, "complete", "1", "--minutes", "50"])
        .assert()
        .failure()
        .stderr(contains("delay reason is required"));

    rmt(name)
        .args([
            "--db",
            &db_path,
            "complete",
            "1",
            "--minutes",
            "50",
            "--delay-reason",
            "Falla mecánica",
        ])
        .assert()
        .success()
        .stdout(contains("Change #1 completed: EDF1 - 50 min (Fuera de meta)"));

    // già completato
    rmt(name)
        .args(["--db", &db_path, "complete", "1", "--minutes", "10"])
        .assert()
        .failure();

    rmt(name)
        .args(["--db", &db_path, "complete", "99", "--minutes", "10"])
        .assert()
        .failure()
        .stderr(contains("Mold change not found: 99"));
}

#[test]
fn test_del_force_removes_change() {
    let name = "del_force_removes";
    let db_path = init_db(name);

    add_completed(name, &db_path, "TB1", "A-1", "A-2", "20");

    rmt(name)
        .args(["--db", &db_path, "del", "1", "--force"])
        .assert()
        .success()
        .stdout(contains("Mold change #1 has been deleted."));

    rmt(name)
        .args(["--db", &db_path, "list"])
        .assert()
        .success()
        .stdout(contains("No mold changes found."));

    rmt(name)
        .args(["--db", &db_path, "del", "1", "--force"])
        .assert()
        .failure()
        .stderr(contains("Mold change not found"));
}

#[test]
fn test_list_filters_by_status_and_line() {
    let name = "list_filters";
    let db_path = init_db(name);

    add_completed(name, &db_path, "TB1", "A-1", "A-2", "20");
    add_completed(name, &db_path, "TB2", "B-1", "B-2", "25");

    rmt(name)
        .args(["--db", &db_path, "list", "--line", "TB1"])
        .assert()
        .success()
        .stdout(contains("A-1 → A-2"))
        .stdout(contains("1 change(s)"));

    rmt(name)
        .args(["--db", &db_path, "list", "--status", "pending"])
        .assert()
        .success()
        .stdout(contains("No mold changes found."));

    rmt(name)
        .args(["--db", &db_path, "list", "--status", "bogus"])
        .assert()
        .failure()
        .stderr(contains("Invalid status: bogus"));
}

#[test]
fn test_status_dashboard_and_history() {
    let name = "status_dashboard";
    let db_path = init_db(name);

    add_completed(name, &db_path, "TB1", "A-1", "A-2", "20");
    add_completed(name, &db_path, "TB1", "A-2", "A-3", "40");

    rmt(name)
        .args(["--db", &db_path, "status"])
        .assert()
        .success()
        .stdout(contains("Today"))
        .stdout(contains("Lines"))
        .stdout(contains("completed 2"));

    rmt(name)
        .args(["--db", &db_path, "status", "--history"])
        .assert()
        .success()
        .stdout(contains("A-2 → A-3"));
}

#[test]
fn test_log_records_operations() {
    let name = "log_records_operations";
    let db_path = init_db(name);

    add_completed(name, &db_path, "TB1", "A-1", "A-2", "20");
    rmt(name)
        .args(["--db", &db_path, "del", "1", "--force"])
        .assert()
        .success();

    rmt(name)
        .args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("Internal log"))
        .stdout(contains("init"))
        .stdout(contains("add"))
        .stdout(contains("del"));
}

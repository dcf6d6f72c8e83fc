use assert_cmd::Command;
use predicates::prelude::*;

fn casona(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("casona").unwrap();
    // Keep settings and data inside the test sandbox.
    cmd.env("HOME", home);
    cmd
}

#[test]
fn test_init_units_import_flow() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");

    casona(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized casona"));

    casona(home.path())
        .args(["units", "add", "Casa Azul", "--code", "CA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added unit: Casa Azul"));

    casona(home.path())
        .args(["units", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Casa Azul"));

    let csv_path = home.path().join("reservas.csv");
    std::fs::write(
        &csv_path,
        "Nombre,Desde,Hasta,Importe\n\
         Ana Garcia,01/03/2024,05/03/2024,\"1.234,56\"\n\
         John Smith,10/03/2024,12/03/2024,\"210,00\"\n",
    )
    .unwrap();

    casona(home.path())
        .args([
            "import",
            csv_path.to_str().unwrap(),
            "--unit",
            "Casa Azul",
            "--map",
            "guest=0",
            "--map",
            "checkin=1",
            "--map",
            "checkout=2",
            "--map",
            "amount=3",
            "--yes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"));

    casona(home.path())
        .args(["reservations"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana Garcia"))
        .stdout(predicate::str::contains("John Smith"));

    // Same file again: rejected by checksum before any rows are touched.
    casona(home.path())
        .args([
            "import",
            csv_path.to_str().unwrap(),
            "--unit",
            "Casa Azul",
            "--map",
            "guest=0",
            "--map",
            "checkin=1",
            "--map",
            "checkout=2",
            "--map",
            "amount=3",
            "--yes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));

    casona(home.path())
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reservas.csv"));

    casona(home.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reservations:  2"));
}

#[test]
fn test_import_unknown_format_without_mapping_fails() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");

    casona(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();

    let csv_path = home.path().join("mystery.csv");
    std::fs::write(&csv_path, "A,B,C\n1,2,3\n").unwrap();

    casona(home.path())
        .args(["import", csv_path.to_str().unwrap(), "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mapping"));
}

#[test]
fn test_unknown_unit_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");

    casona(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();

    casona(home.path())
        .args(["alias", "add", "Some listing", "--unit", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown billing unit"));
}

#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_catalog_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: load a custom catalog
    let mut catalog = tempfile::NamedTempFile::new().unwrap();
    writeln!(catalog, "id, name, price").unwrap();
    writeln!(catalog, "6f1c1bde-5f43-4c55-9a3e-0d0f9b6a1a01, Monitor, 899.50").unwrap();

    let mut cmd1 = Command::new(cargo_bin!("niubiz-checkout"));
    cmd1.arg("--db-path")
        .arg(&db_path)
        .arg("--catalog")
        .arg(catalog.path())
        .arg("products");

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("Monitor,899.50"));

    // 2. Second run: same DB, no catalog file; nothing is re-seeded
    let mut cmd2 = Command::new(cargo_bin!("niubiz-checkout"));
    cmd2.arg("--db-path").arg(&db_path).arg("products");

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    assert!(stdout2.contains("Monitor,899.50"));
    assert!(!stdout2.contains("Laptop"));
}

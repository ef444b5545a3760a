use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = r#"
initial = ["help"]

[[extensions]]
name = "help"

[[extensions]]
name = "config"
requires = ["help"]

[[extensions]]
name = "color"
requires = ["config"]

[[extensions]]
name = "system"

[[extensions]]
name = "ban"
"#;

fn site() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let manifest = dir.path().join("modula.toml");
    std::fs::write(&manifest, MANIFEST).expect("Failed to write manifest");
    (dir, manifest)
}

fn modula(manifest: &Path) -> Command {
    let mut cmd = Command::cargo_bin("modula").expect("binary should build");
    cmd.arg("--manifest").arg(manifest);
    cmd
}

#[test]
fn test_ping_command() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("modula")?;
    cmd.arg("--ping");
    cmd.assert().success().stdout(predicate::str::contains("pong"));
    Ok(())
}

#[test]
fn test_list_seeded_from_manifest() {
    let (_dir, manifest) = site();
    modula(&manifest)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::eq("help\n"));
}

#[test]
fn test_install_persists_state() {
    let (dir, manifest) = site();
    modula(&manifest)
        .args(["install", "color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed: config, color"));
    assert!(dir.path().join("modula-state.json").exists());

    modula(&manifest)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::eq("help\nconfig\ncolor\n"));
}

#[test]
fn test_uninstall_blocked_by_dependents() {
    let (_dir, manifest) = site();
    modula(&manifest).args(["install", "color"]).assert().success();

    modula(&manifest)
        .args(["uninstall", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still required by color"));

    modula(&manifest)
        .args(["uninstall", "config", "--with-dependents"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uninstalled: color, config"));
}

#[test]
fn test_plan_does_not_apply() {
    let (_dir, manifest) = site();
    modula(&manifest)
        .args(["plan", "install", "color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. config\n2. color"));

    modula(&manifest)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::eq("help\n"));
}

#[test]
fn test_set_weight_reorders() {
    let (dir, manifest) = site();
    let state = dir.path().join("custom").join("state.json");
    let with_state = |args: &[&str]| {
        let mut cmd = modula(&manifest);
        cmd.arg("--state").arg(&state).args(args);
        cmd
    };

    with_state(&["install", "system", "ban"]).assert().success();
    with_state(&["list"])
        .assert()
        .success()
        .stdout(predicate::eq("ban\nhelp\nsystem\n"));

    with_state(&["set-weight", "ban", "20"]).assert().success();
    with_state(&["set-weight", "system", "-5"]).assert().success();
    with_state(&["list"])
        .assert()
        .success()
        .stdout(predicate::eq("system\nhelp\nban\n"));
}

#[test]
fn test_missing_manifest_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    modula(&dir.path().join("absent.toml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

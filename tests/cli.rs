//! End-to-end checks of the vaultkeeper binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn vaultkeeper(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vaultkeeper").unwrap();
    // Cheap key derivation keeps the interactive runs fast
    cmd.env("VAULTKEEPER_DATA_DIR", data_dir.path())
        .env("VAULTKEEPER_FAST_KDF", "1")
        .env_remove("VAULTKEEPER_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    vaultkeeper(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backups"))
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn config_shows_paths_under_data_dir() {
    let temp = TempDir::new().unwrap();
    vaultkeeper(&temp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            temp.path().join("data.enc").display().to_string(),
        ))
        .stdout(predicate::str::contains("Password length:    12"));
}

#[test]
fn init_writes_settings() {
    let temp = TempDir::new().unwrap();
    vaultkeeper(&temp).arg("init").assert().success();

    assert!(temp.path().join("config.json").exists());
    assert!(temp.path().join("backups").is_dir());
}

#[test]
fn invalid_settings_are_rejected() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.json"), r#"{"password_length": 3}"#).unwrap();

    vaultkeeper(&temp)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("password_length"));
}

#[test]
fn backups_empty() {
    let temp = TempDir::new().unwrap();
    vaultkeeper(&temp)
        .arg("backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups found."));
}

#[test]
fn interactive_session_creates_encrypted_vault() {
    let temp = TempDir::new().unwrap();

    let script = "\nmaster-pass\nmaster-pass\n1\nGitHub\noctocat\nhunter2-secret\nhttps://github.com\n4\n";
    vaultkeeper(&temp)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault saved. Goodbye."));

    let vault = std::fs::read(temp.path().join("data.enc")).unwrap();
    assert!(!String::from_utf8_lossy(&vault).contains("hunter2-secret"));
    assert!(temp.path().join("token.enc").exists());

    vaultkeeper(&temp)
        .args(["audit", "-n", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE Credential https://github.com (GitHub)"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn wrong_passphrase_three_times_locks_out() {
    let temp = TempDir::new().unwrap();

    vaultkeeper(&temp)
        .write_stdin("\nmaster-pass\nmaster-pass\n4\n")
        .assert()
        .success();

    vaultkeeper(&temp)
        .write_stdin("\nwrong1\nwrong2\nwrong3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Too many failed attempts"));
    assert!(temp.path().join("block.lock").exists());

    // The lockout outlives the process
    vaultkeeper(&temp)
        .write_stdin("\nmaster-pass\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Access blocked for another 20 minutes"));
}

#[test]
fn key_derivation_in_config_does_not_break_unlock() {
    let temp = TempDir::new().unwrap();

    vaultkeeper(&temp)
        .write_stdin("\nmaster-pass\nmaster-pass\n4\n")
        .assert()
        .success();

    std::fs::write(
        temp.path().join("config.json"),
        r#"{"key_derivation": {"memory_cost": 512, "time_cost": 2, "parallelism": 1}}"#,
    )
    .unwrap();

    for _ in 0..3 {
        vaultkeeper(&temp)
            .write_stdin("\nmaster-pass\n4\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Vault loaded from"))
            .stdout(predicate::str::contains("Wrong passphrase").not());
    }
    assert!(!temp.path().join("block.lock").exists());
}

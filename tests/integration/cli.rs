use assert_cmd::Command;
use predicates::prelude::*;

use super::common::FakeLpass;

/// The binary with a clean environment rooted in the fixture directory.
fn lpass_resolve(lpass: &FakeLpass) -> Command {
    let mut cmd = Command::cargo_bin("lpass-resolve").unwrap();
    cmd.env("HOME", lpass.path())
        .env("NO_COLOR", "1")
        .env_remove("LPASS_RESOLVE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_resolves_file_to_stdout() {
    let lpass = FakeLpass::new();
    let input = lpass.write("app.yml", "user: ((db/Username))\npass: ((db/Password))\nagain: ((db/Password))\n");

    lpass_resolve(&lpass)
        .arg(&input)
        .args(["--lpass-command", lpass.command()])
        .assert()
        .success()
        .stdout("user: \"admin\"\npass: \"s3cr3t\"\nagain: \"s3cr3t\"\n");

    assert_eq!(lpass.calls(), ["show --username db", "show --password db"]);
}

#[test]
fn test_reads_stdin_and_writes_output_file() {
    let lpass = FakeLpass::new();
    let output = lpass.path().join("out.json");

    lpass_resolve(&lpass)
        .args(["-", "--lpass-command", lpass.command(), "-o"])
        .arg(&output)
        .write_stdin(r#"{"key": ((api/Notes/api_key)), "tls": ((api/Notes/tls))}"#)
        .assert()
        .success()
        .stdout("");

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        r#"{"key": "abc123", "tls": true}"#
    );
}

#[test]
fn test_document_without_placeholders_passes_through() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--lpass-command", "lpass-resolve-no-such-binary"])
        .write_stdin("plain: text\n")
        .assert()
        .success()
        .stdout("plain: text\n");
}

#[test]
fn test_list_prints_handles() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--list", "--lpass-command", lpass.command()])
        .write_stdin("a: ((db/Password)) b: ((api/Notes/api_key))\nc: ((broken))\n")
        .assert()
        .success()
        .stdout("db/Password\napi/Notes/api_key\nbroken\n");

    assert!(lpass.calls().is_empty());
}

#[test]
fn test_unknown_entry_fails_without_output() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--lpass-command", lpass.command()])
        .write_stdin("ok: ((db/Password))\nbad: ((nope/Password))\n")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Failed to fetch 'nope/Password'"))
        .stderr(predicate::str::contains("lpass login"))
        .stderr(predicate::str::contains("Could not find specified account"));
}

#[test]
fn test_malformed_handle_fails_before_fetching() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--lpass-command", lpass.command()])
        .write_stdin("bad: ((db))\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed credential handle 'db'"));

    assert!(lpass.calls().is_empty());
}

#[test]
fn test_keep_going_marks_failures() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--keep-going", "--lpass-command", lpass.command()])
        .write_stdin("ok: ((db/Password))\nbad: ((nope/Password))\nkey: ((api/Notes/nothing))\n")
        .assert()
        .failure()
        .code(1)
        .stdout("ok: \"s3cr3t\"\nbad: ((!unresolved nope/Password))\nkey: ((!unresolved api/Notes/nothing))\n")
        .stderr(predicate::str::contains("((nope/Password))"))
        .stderr(predicate::str::contains("2 of 3 placeholders could not be resolved"));
}

#[test]
fn test_missing_lpass_command() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--lpass-command", "lpass-resolve-no-such-binary"])
        .write_stdin("pass: ((db/Password))\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'lpass-resolve-no-such-binary' is not installed"))
        .stderr(predicate::str::contains("lastpass-cli"));
}

#[test]
fn test_timeout_flag() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .args(["--timeout", "1", "--lpass-command", lpass.command()])
        .write_stdin("pass: ((slow/Password))\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timed out after 1 seconds"));
}

#[test]
fn test_config_file_from_environment() {
    let lpass = FakeLpass::new();
    let config = lpass.write(
        "resolve.toml",
        &format!("lpass_command = \"{}\"\non_error = \"marker\"\n", lpass.command()),
    );

    lpass_resolve(&lpass)
        .env("LPASS_RESOLVE_CONFIG", &config)
        .write_stdin("a: ((db/Username))\nb: ((nope/URL))\n")
        .assert()
        .failure()
        .stdout("a: \"admin\"\nb: ((!unresolved nope/URL))\n");
}

#[test]
fn test_default_config_location() {
    let lpass = FakeLpass::new();
    std::fs::create_dir_all(lpass.path().join(".lpass-resolve")).unwrap();
    lpass.write(
        ".lpass-resolve/config.toml",
        &format!("lpass_command = \"{}\"\n", lpass.command()),
    );

    lpass_resolve(&lpass)
        .write_stdin("url: ((empty/URL))\n")
        .assert()
        .success()
        .stdout("url: \"\"\n");
}

#[test]
fn test_invalid_config_is_reported() {
    let lpass = FakeLpass::new();
    let config = lpass.write("bad.toml", "timeout = 5\n");

    lpass_resolve(&lpass)
        .arg("--config")
        .arg(&config)
        .write_stdin("a: ((db/Username))\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"))
        .stderr(predicate::str::contains("Supported keys"));
}

#[test]
fn test_missing_input_file() {
    let lpass = FakeLpass::new();

    lpass_resolve(&lpass)
        .arg(lpass.path().join("absent.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

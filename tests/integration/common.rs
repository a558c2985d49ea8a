//! Fake `lpass` executable for integration tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Canned responses, keyed on `<flag> <entry>`.
///
/// - `db` has a password and a username
/// - `api` keeps a YAML document in its notes and a custom `token` field
/// - `empty` has an empty URL
/// - `slow` never answers in time
/// - anything else fails like an unknown account
const SCRIPT: &str = r#"#!/bin/sh
echo "$*" >> '__LOG__'
case "$2 $3" in
  "--password db") printf 's3cr3t\n' ;;
  "--username db") printf 'admin\n' ;;
  "--notes api") printf 'api_key: abc123\nport: 8080\ntls: true\nhosts:\n  - a.example.com\n  - b.example.com\n' ;;
  "--field=token api") printf '  tok-123  \n' ;;
  "--url empty") printf '' ;;
  "--password slow") exec sleep 5 ;;
  *) echo "Error: Could not find specified account(s)." >&2; exit 1 ;;
esac
"#;

/// A temp directory holding a fake `lpass` script and an invocation log.
pub struct FakeLpass {
    dir: TempDir,
    script: PathBuf,
    log: PathBuf,
}

impl FakeLpass {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("lpass");
        let log = dir.path().join("calls.log");

        fs::write(&script, SCRIPT.replace("__LOG__", log.to_str().unwrap())).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir, script, log }
    }

    /// Absolute path of the script, for `--lpass-command`.
    pub fn command(&self) -> &str {
        self.script.to_str().unwrap()
    }

    /// Scratch directory for inputs, outputs and config files.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the scratch directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Arguments of every invocation so far, one string per call.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|log| log.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

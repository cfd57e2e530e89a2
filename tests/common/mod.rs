//! Shared integration-test harness: runs the `onerep` binary against a
//! throwaway data directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

/// Upper bound for an interactive session to wind down.
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// An isolated `onerep` installation.
pub struct OneRep {
    dir: TempDir,
}

impl OneRep {
    #[allow(clippy::missing_panics_doc)]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path inside the data directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--data-dir".to_string(),
            self.dir.path().display().to_string(),
        ]
    }

    fn std_command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_onerep"));
        cmd.env_remove("ONEREP_CONFIG")
            .env_remove("ONEREP_DATA_DIR")
            .env_remove("ONEREP_LOG_LEVEL")
            .args(self.base_args());
        cmd
    }

    /// Runs one command to completion.
    #[allow(clippy::missing_panics_doc)]
    pub fn run(&self, args: &[&str]) -> Output {
        self.std_command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run onerep")
    }

    /// Runs one command, asserts success and returns stdout.
    #[allow(clippy::missing_panics_doc)]
    pub fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "`onerep {}` failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Runs a command with `--format json` appended and parses stdout.
    #[allow(clippy::missing_panics_doc)]
    pub fn json(&self, args: &[&str]) -> Value {
        let mut full = args.to_vec();
        full.extend(["--format", "json"]);
        let stdout = self.ok(&full);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
    }

    /// Runs the interactive timer, feeding `lines` to stdin then closing it.
    #[allow(clippy::missing_panics_doc)]
    pub async fn interactive(&self, args: &[&str], lines: &[&str]) -> Output {
        let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_onerep"))
            .env_remove("ONEREP_CONFIG")
            .env_remove("ONEREP_DATA_DIR")
            .args(self.base_args())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn onerep");

        let mut stdin = child.stdin.take().expect("stdin not captured");
        for line in lines {
            stdin
                .write_all(format!("{line}\n").as_bytes())
                .await
                .expect("write to stdin");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        drop(stdin);

        tokio::time::timeout(EXIT_TIMEOUT, child.wait_with_output())
            .await
            .expect("onerep did not exit in time")
            .expect("failed to collect output")
    }
}

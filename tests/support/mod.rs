#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const PASSWORD: &str = "hunter22";

/// A throwaway data directory with a fast-hashing config.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let env = Self { dir };
        env.write_config("[auth]\nhash_rounds = 25\n");
        env
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.path("daycard.toml"), contents).expect("write config");
    }

    /// `daycard` pointed at this data directory, isolated from the caller's env.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("daycard").expect("binary");
        cmd.env_remove("RUST_LOG")
            .env_remove("DAYCARD_PASSWORD")
            .env("DAYCARD_DATA_DIR", self.dir.path());
        cmd
    }

    /// Run with `--json` and return the parsed envelope; asserts success.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    pub fn signup(&self, name: &str, email: &str) -> Value {
        self.json(&[
            "signup",
            "--name",
            name,
            "--email",
            email,
            "--password",
            PASSWORD,
        ])
    }

    /// Add tasks and return their ids in argument order.
    pub fn add(&self, date: &str, tasks: &[&str]) -> Vec<String> {
        let mut args = vec!["add", "--date", date];
        args.extend_from_slice(tasks);
        let value = self.json(&args);
        value["data"]["tasks"]
            .as_array()
            .expect("tasks array")
            .iter()
            .map(|task| task["id"].as_str().expect("task id").to_string())
            .collect()
    }
}

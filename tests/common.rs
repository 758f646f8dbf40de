use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub bin_path: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("jdkman");
        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_jdkman"));

        Self {
            temp_dir,
            root,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("JDKMAN_DIR", &self.root);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("JDKMAN_INDEX_URL");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write a tarball wrapping `files` in a single top-level directory.
    pub fn write_tgz(&self, name: &str, files: &[&str]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let file = std::fs::File::create(&path).expect("Failed to create archive");
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for file in files {
            let data = b"#!/bin/sh\necho 'openjdk version \"1.8.0\"'\n";
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(0o755);
            header.set_size(data.len() as u64);
            builder
                .append_data(&mut header, Path::new("jdk1.8.0_202").join(file), &data[..])
                .expect("Failed to append archive entry");
        }
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .expect("Failed to finish archive");
        path
    }
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}

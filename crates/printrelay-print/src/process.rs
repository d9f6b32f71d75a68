// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External process execution seam.
//
// The print mechanism, the headless renderer and printer enumeration all
// shell out.  They go through `ProcessRunner` so tests can observe the
// invocations without a spooler or browser installed.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Message describing an unsuccessful run: stderr when present,
    /// otherwise the exit status.
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        match (self.code, stderr.is_empty()) {
            (Some(code), false) => format!("exit status {code}: {stderr}"),
            (Some(code), true) => format!("exit status {code}"),
            (None, false) => format!("terminated by signal: {stderr}"),
            (None, true) => "terminated by signal".to_owned(),
        }
    }
}

/// Runs a program to completion and captures its output.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[&str]) -> std::io::Result<ProcessOutput>;
}

/// Spawns real child processes via Tokio.
///
/// Children are killed if the awaiting future is dropped, so an expired
/// timeout does not leave the print helper running.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[&str]) -> std::io::Result<ProcessOutput> {
        debug!(program = %program.display(), ?args, "spawning process");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ProcessOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

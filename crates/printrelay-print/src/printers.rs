// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer directory: names of the print queues installed on this host.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use printrelay_core::error::{PrintRelayError, Result};

use crate::command::Platform;
use crate::process::{ProcessRunner, SystemRunner};

/// Lists installed printers.
#[async_trait]
pub trait PrinterDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<String>>;
}

/// Queries the OS spooler: `lpstat -e` on Linux/macOS, `Get-Printer` through
/// PowerShell on Windows.
pub struct SystemPrinterDirectory {
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
}

impl SystemPrinterDirectory {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            runner: Arc::new(SystemRunner),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    fn query(&self) -> (&'static str, &'static [&'static str]) {
        match self.platform {
            Platform::Linux | Platform::MacOs => ("lpstat", &["-e"]),
            Platform::Windows => (
                "powershell.exe",
                &[
                    "-NoProfile",
                    "-NonInteractive",
                    "-Command",
                    "Get-Printer | Select-Object -ExpandProperty Name",
                ],
            ),
        }
    }
}

#[async_trait]
impl PrinterDirectory for SystemPrinterDirectory {
    async fn list(&self) -> Result<Vec<String>> {
        let (program, args) = self.query();
        let output = self
            .runner
            .run(Path::new(program), args)
            .await
            .map_err(|e| PrintRelayError::Printers(format!("{program}: {e}")))?;

        if !output.success {
            // lpstat exits non-zero when no destinations are configured.
            if output.stdout.trim().is_empty() && output.stderr.contains("No destinations") {
                debug!("no printers configured");
                return Ok(Vec::new());
            }
            return Err(PrintRelayError::Printers(format!(
                "{program}: {}",
                output.error_message()
            )));
        }

        let printers = parse_names(&output.stdout);
        info!(count = printers.len(), "printers enumerated");
        Ok(printers)
    }
}

/// One printer name per non-blank line.
fn parse_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print execution: bytes → temp artifact → print mechanism.
//
// The artifact is fully written before the command is built and belongs to
// this invocation alone; it is removed once the command has finished,
// whatever the outcome.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use printrelay_core::error::{PrintRelayError, Result};
use printrelay_core::types::PrintSettings;

use crate::artifact::TempArtifact;
use crate::command::CommandTranslator;
use crate::process::{ProcessRunner, SystemRunner};

/// Sends resolved documents to the OS print mechanism.
pub struct PrintExecutor {
    translator: Arc<dyn CommandTranslator>,
    runner: Arc<dyn ProcessRunner>,
    temp_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl PrintExecutor {
    pub fn new(translator: Arc<dyn CommandTranslator>) -> Self {
        Self {
            translator,
            runner: Arc::new(SystemRunner),
            temp_dir: None,
            timeout: None,
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Bound each print command; `None` waits for it indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Print `document` on `printer`. Returns the mechanism's stdout.
    #[instrument(skip(self, document, settings), fields(bytes = document.len()))]
    pub async fn execute(&self, document: &[u8], printer: &str, settings: &PrintSettings) -> Result<String> {
        let artifact = TempArtifact::create(self.temp_dir.as_deref())?;
        artifact.write_all(document).await?;

        let command = self.translator.build(artifact.path(), printer, settings);
        let program = command.program_name();
        info!(
            command = %command,
            sha256 = %hex::encode(Sha256::digest(document)),
            "executing print command"
        );

        let argv = command.argv();
        let run = self.runner.run(&command.program, &argv);
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(program = %program, secs = limit.as_secs(), "print command timed out");
                    return Err(PrintRelayError::Timeout {
                        stage: format!("{program} on {printer}"),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => run.await,
        };

        let output = outcome.map_err(|e| PrintRelayError::Execution {
            program: program.clone(),
            message: e.to_string(),
        })?;

        if let Err(e) = artifact.close() {
            warn!(error = %e, "temp artifact left behind");
        }

        if !output.success {
            let message = output.error_message();
            warn!(program = %program, error = %message, "print command failed");
            return Err(PrintRelayError::Execution { program, message });
        }

        info!(program = %program, "print command succeeded");
        Ok(output.stdout)
    }
}

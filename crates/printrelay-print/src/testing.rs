// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory collaborators shared by the router, server and channel tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use printrelay_core::error::Result;

use crate::batch::BatchCoordinator;
use crate::command::LpTranslator;
use crate::executor::PrintExecutor;
use crate::printers::PrinterDirectory;
use crate::process::{ProcessOutput, ProcessRunner};
use crate::render::DocumentRenderer;
use crate::resolver::ContentResolver;
use crate::session::SessionContext;

/// "Renders" a URL as its own bytes.
#[derive(Default)]
pub struct EchoRenderer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DocumentRenderer for EchoRenderer {
    async fn render_pdf(&self, url: &str, _user_agent: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(url.as_bytes().to_vec())
    }
}

/// Accepts every print command, recording argv and the artifact contents
/// once the command "finishes" after `delay`.
#[derive(Default)]
pub struct AcceptingRunner {
    pub invocations: Mutex<Vec<(Vec<String>, Vec<u8>)>>,
    pub started: AtomicUsize,
    pub delay: Duration,
}

impl AcceptingRunner {
    pub fn invocation_for(&self, printer: &str) -> Option<(Vec<String>, Vec<u8>)> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .find(|(args, _)| args.iter().any(|a| a == printer))
            .cloned()
    }
}

#[async_trait]
impl ProcessRunner for AcceptingRunner {
    async fn run(&self, _program: &Path, args: &[&str]) -> std::io::Result<ProcessOutput> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let contents = std::fs::read(args.last().expect("file argument"))?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.invocations
            .lock()
            .unwrap()
            .push((args.iter().map(|a| a.to_string()).collect(), contents));
        Ok(ProcessOutput {
            code: Some(0),
            success: true,
            stdout: "request id is queued\n".into(),
            stderr: String::new(),
        })
    }
}

pub struct FixedDirectory(pub Vec<&'static str>);

#[async_trait]
impl PrinterDirectory for FixedDirectory {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

/// A wired pipeline backed by the fakes above.
pub struct Harness {
    pub renderer: Arc<EchoRenderer>,
    pub runner: Arc<AcceptingRunner>,
    pub coordinator: Arc<BatchCoordinator>,
    pub session: Arc<SessionContext>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_print_delay(Duration::ZERO)
    }

    /// Every print command takes `delay` to complete.
    pub fn with_print_delay(delay: Duration) -> Self {
        let renderer = Arc::new(EchoRenderer::default());
        let runner = Arc::new(AcceptingRunner {
            delay,
            ..Default::default()
        });
        let coordinator = BatchCoordinator::new(
            ContentResolver::new(renderer.clone()),
            PrintExecutor::new(Arc::new(LpTranslator)).with_runner(runner.clone()),
        )
        .into_shared();
        let session = Arc::new(SessionContext::new(Arc::new(FixedDirectory(vec!["P1", "P2"]))));
        Self {
            renderer,
            runner,
            coordinator,
            session,
        }
    }
}

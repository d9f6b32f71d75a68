// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job batch coordination: fan out every job, await all, keep input order.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{Instrument, info, info_span, warn};

use printrelay_core::error::Result;
use printrelay_core::types::{JobResult, PrintJob};

use crate::executor::PrintExecutor;
use crate::resolver::ContentResolver;

/// Runs resolver and executor for each job of a batch concurrently.
pub struct BatchCoordinator {
    resolver: ContentResolver,
    executor: PrintExecutor,
}

impl BatchCoordinator {
    pub fn new(resolver: ContentResolver, executor: PrintExecutor) -> Self {
        Self { resolver, executor }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Run every job; `result[i]` belongs to `jobs[i]`. Never fails as a
    /// whole; each job's error is captured in its own result.
    pub async fn run(&self, jobs: &[PrintJob]) -> Vec<JobResult> {
        if jobs.is_empty() {
            return Vec::new();
        }
        info!(jobs = jobs.len(), "print batch received");

        let results = join_all(jobs.iter().map(|job| self.print_one(job))).await;

        let failed = results.iter().filter(|r| !r.success).count();
        info!(jobs = jobs.len(), failed, "print batch finished");
        results
    }

    /// Resolve and print a single job.
    pub async fn print_one(&self, job: &PrintJob) -> JobResult {
        let span = info_span!("job", job_id = %job.id, printer = %job.printer, url = %job.url);
        let outcome = self.resolve_and_print(job).instrument(span.clone()).await;
        let _entered = span.enter();
        match &outcome {
            Ok(_) => info!("job printed"),
            Err(e) => warn!(error = %e, "job failed"),
        }
        JobResult::from(outcome)
    }

    async fn resolve_and_print(&self, job: &PrintJob) -> Result<String> {
        let document = self.resolver.resolve(job).await?;
        self.executor
            .execute(&document, &job.printer, &job.settings)
            .await
    }
}

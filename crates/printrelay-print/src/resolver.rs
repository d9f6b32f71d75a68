// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content resolution: job → raw document bytes.
//
// A job either carries its document inline (base64) or names a URL that the
// rendering collaborator turns into a PDF.  Inline content never touches the
// renderer.  Every failure on the render path is tagged with the job's URL.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, instrument, warn};

use printrelay_core::error::{PrintRelayError, Result};
use printrelay_core::types::PrintJob;

use crate::render::DocumentRenderer;

/// User agent presented to every page the renderer loads.
pub const USER_AGENT: &str = concat!("PrintRelay / ", env!("CARGO_PKG_VERSION"));

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Decode an inline document.
///
/// Accepts standard or URL-safe base64, with or without padding, an optional
/// `data:...;base64,` prefix, and embedded line breaks.
pub fn decode_inline(content: &str) -> Result<Vec<u8>> {
    let payload = match content.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => content,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(PrintRelayError::InlineContent("document is empty".into()));
    }
    STANDARD_LENIENT
        .decode(&compact)
        .or_else(|_| URL_SAFE_LENIENT.decode(&compact))
        .map_err(|e| PrintRelayError::InlineContent(format!("not valid base64: {e}")))
}

/// Resolves jobs into printable bytes.
pub struct ContentResolver {
    renderer: Arc<dyn DocumentRenderer>,
    user_agent: String,
    timeout: Option<Duration>,
}

impl ContentResolver {
    pub fn new(renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            renderer,
            user_agent: USER_AGENT.to_owned(),
            timeout: None,
        }
    }

    /// Bound each render call; `None` waits for the renderer indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produce the document bytes for `job`.
    #[instrument(skip_all, fields(job_id = %job.id, url = %job.url, inline = job.inline_content.is_some()))]
    pub async fn resolve(&self, job: &PrintJob) -> Result<Vec<u8>> {
        if let Some(content) = &job.inline_content {
            let bytes = decode_inline(content)?;
            debug!(bytes = bytes.len(), "inline document decoded");
            return Ok(bytes);
        }

        if job.url.trim().is_empty() {
            return Err(PrintRelayError::Resolution {
                url: String::new(),
                message: "job has neither content nor a URL".into(),
            });
        }

        let render = self.renderer.render_pdf(&job.url, &self.user_agent);
        let rendered = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, render).await.map_err(|_| {
                warn!(secs = limit.as_secs(), "render timed out");
                PrintRelayError::Timeout {
                    stage: format!("rendering {}", job.url),
                    secs: limit.as_secs(),
                }
            })?,
            None => render.await,
        };

        rendered.map_err(|e| match e {
            PrintRelayError::Resolution { .. } => e,
            other => PrintRelayError::Resolution {
                url: job.url.clone(),
                message: other.to_string(),
            },
        })
    }
}

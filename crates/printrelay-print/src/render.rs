// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering collaborator: turns a URL into PDF bytes.
//
// The bundled implementation drives a headless Chromium through its
// `--print-to-pdf` switch.  Rendering itself is entirely the browser's job;
// this module only builds the invocation and collects the output file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use printrelay_core::error::{PrintRelayError, Result};

use crate::command::Platform;
use crate::process::{ProcessRunner, SystemRunner};

/// A service that loads a page and prints it to PDF.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Load `url` identifying as `user_agent` and return the PDF bytes.
    async fn render_pdf(&self, url: &str, user_agent: &str) -> Result<Vec<u8>>;
}

/// Default browser binary for `platform`, used when none is configured.
pub fn default_chromium_binary(platform: Platform) -> PathBuf {
    match platform {
        Platform::Linux => PathBuf::from("chromium"),
        Platform::MacOs => {
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome")
        }
        Platform::Windows => PathBuf::from("chrome.exe"),
    }
}

/// Only page URLs are rendered; anything else could be read by the browser
/// as a command-line switch.
fn check_url(url: &str) -> Result<()> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file://") {
        Ok(())
    } else {
        Err(PrintRelayError::Resolution {
            url: url.to_owned(),
            message: "only http, https and file URLs can be rendered".into(),
        })
    }
}

/// Headless Chromium renderer.
pub struct ChromiumRenderer {
    binary: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    temp_dir: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            runner: Arc::new(SystemRunner),
            temp_dir: None,
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

    fn output_file(&self) -> Result<tempfile::TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("render_").suffix(".pdf");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| PrintRelayError::Artifact(format!("create render output: {e}")))?;
        Ok(file.into_temp_path())
    }

    fn args(url: &str, user_agent: &str, output: &Path) -> Vec<String> {
        vec![
            "--headless".to_owned(),
            "--disable-gpu".to_owned(),
            "--no-pdf-header-footer".to_owned(),
            format!("--user-agent={user_agent}"),
            format!("--print-to-pdf={}", output.display()),
            url.to_owned(),
        ]
    }
}

#[async_trait]
impl DocumentRenderer for ChromiumRenderer {
    async fn render_pdf(&self, url: &str, user_agent: &str) -> Result<Vec<u8>> {
        check_url(url)?;
        let output = self.output_file()?;
        let args = Self::args(url, user_agent, &output);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();

        debug!(url, browser = %self.binary.display(), "rendering page to PDF");
        let result = self
            .runner
            .run(&self.binary, &argv)
            .await
            .map_err(|e| PrintRelayError::Resolution {
                url: url.to_owned(),
                message: format!("start {}: {e}", self.binary.display()),
            })?;
        if !result.success {
            return Err(PrintRelayError::Resolution {
                url: url.to_owned(),
                message: result.error_message(),
            });
        }

        let pdf = tokio::fs::read(&*output).await.map_err(|e| PrintRelayError::Resolution {
            url: url.to_owned(),
            message: format!("read rendered PDF: {e}"),
        })?;
        if pdf.is_empty() {
            return Err(PrintRelayError::Resolution {
                url: url.to_owned(),
                message: "renderer produced an empty document".into(),
            });
        }
        info!(url, bytes = pdf.len(), "page rendered");
        Ok(pdf)
    }
}

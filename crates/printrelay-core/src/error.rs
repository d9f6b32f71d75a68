// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for PrintRelay.

use thiserror::Error;

/// Top-level error type for all PrintRelay operations.
#[derive(Debug, Error)]
pub enum PrintRelayError {
    // -- Per-job errors --
    #[error("failed to resolve {url}: {message}")]
    Resolution { url: String, message: String },

    #[error("invalid inline document content: {0}")]
    InlineContent(String),

    #[error("temporary document error: {0}")]
    Artifact(String),

    #[error("{program} failed: {message}")]
    Execution { program: String, message: String },

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: String, secs: u64 },

    // -- Server lifecycle --
    #[error("failed to bind {addr}: {message}")]
    ServerBind { addr: String, message: String },

    #[error("print server is already running")]
    ServerAlreadyRunning,

    #[error("TLS configuration error: {0}")]
    Tls(String),

    // -- Host / configuration --
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("printer enumeration failed: {0}")]
    Printers(String),

    #[error("in-process channel closed")]
    ChannelClosed,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrintRelayError>;

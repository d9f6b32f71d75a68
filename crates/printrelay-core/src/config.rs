// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, persisted as `config.json` in the data
// directory and read once at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PrintRelayError, Result};
use crate::types::HttpsSettings;

/// Default bind address for the HTTP print server.
pub const DEFAULT_SERVER_IP: &str = "localhost";

/// Default port for the HTTP print server.
pub const DEFAULT_SERVER_PORT: u16 = 3179;

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub print: PrintConfig,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hostname or IP address to bind.
    pub ip: String,
    pub port: u16,
    /// Start the server as soon as the application is up.
    pub autostart: bool,
    pub https: HttpsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: DEFAULT_SERVER_IP.into(),
            port: DEFAULT_SERVER_PORT,
            autostart: true,
            https: HttpsConfig::default(),
        }
    }
}

/// TLS material, given inline as PEM or as paths to PEM files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpsConfig {
    pub use_https: bool,
    pub https_cert: Option<String>,
    pub https_cert_key: Option<String>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

impl HttpsConfig {
    /// Resolve the configured material into listener settings, reading PEM
    /// files when paths are given. Inline PEM wins over paths.
    pub fn resolve(&self) -> Result<HttpsSettings> {
        if !self.use_https {
            return Ok(HttpsSettings::plain());
        }
        let https_cert = read_pem(self.https_cert.as_deref(), self.cert_path.as_deref(), "certificate")?;
        let https_cert_key = read_pem(self.https_cert_key.as_deref(), self.key_path.as_deref(), "private key")?;
        Ok(HttpsSettings {
            use_https: true,
            https_cert,
            https_cert_key,
        })
    }
}

fn read_pem(inline: Option<&str>, path: Option<&Path>, what: &str) -> Result<String> {
    match (inline, path) {
        (Some(pem), _) => Ok(pem.to_owned()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
            PrintRelayError::Config(format!("read TLS {what} {}: {e}", path.display()))
        }),
        (None, None) => Err(PrintRelayError::Config(format!(
            "HTTPS enabled but no {what} configured"
        ))),
    }
}

/// Rendering collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Chromium/Chrome binary used for URL → PDF rendering.
    pub chromium_path: Option<PathBuf>,
    /// Upper bound for one page load + render. `null` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chromium_path: None,
            timeout_secs: Some(120),
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Print mechanism settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Directory holding bundled helpers (`external/<platform>/<arch>/...`).
    pub resources_dir: Option<PathBuf>,
    /// Explicit SumatraPDF location, overriding the bundled one.
    pub sumatra_path: Option<PathBuf>,
    /// Where temporary PDFs are written. Defaults to the OS temp dir.
    pub temp_dir: Option<PathBuf>,
    /// Upper bound for one print command. `null` waits forever.
    pub timeout_secs: Option<u64>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            resources_dir: None,
            sumatra_path: None,
            temp_dir: None,
            timeout_secs: Some(300),
        }
    }
}

impl PrintConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load the config at `path`, falling back to defaults when the file
    /// does not exist. A file that exists but does not parse is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&data)
            .map_err(|e| PrintRelayError::Config(format!("parse {}: {e}", path.display())))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Write the config to `path` as pretty-printed JSON.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: builds the print pipeline from the loaded
// configuration and hands out the UI channel that owns the HTTP server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use printrelay_core::AppConfig;
use printrelay_core::error::Result;
use printrelay_core::types::ServerStatus;
use printrelay_print::BatchCoordinator;
use printrelay_print::channel::{ChannelHandle, ChannelService};
use printrelay_print::command::{CommandTranslator, Platform, translator_for};
use printrelay_print::executor::PrintExecutor;
use printrelay_print::http::{HttpState, router};
use printrelay_print::printers::SystemPrinterDirectory;
use printrelay_print::render::{ChromiumRenderer, default_chromium_binary};
use printrelay_print::resolver::ContentResolver;
use printrelay_print::server::PrintServer;
use printrelay_print::session::SessionContext;
use tracing::{error, info};

use super::data_dir;

/// Shared application services.
pub struct AppServices {
    config: AppConfig,
    config_path: PathBuf,
    platform: Platform,
    coordinator: Arc<BatchCoordinator>,
    session: Arc<SessionContext>,
}

impl AppServices {
    /// Load (or create) the configuration under `data_dir` and build the
    /// pipeline. `config_override` replaces the default config location.
    pub fn init(data_dir: &Path, config_override: Option<&Path>) -> Result<Self> {
        let config_path = config_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir::config_path(data_dir));
        info!(path = %config_path.display(), "initialising app services");

        let config = AppConfig::load(&config_path)?;
        if !config_path.exists() {
            config.persist(&config_path)?;
            info!(path = %config_path.display(), "default configuration written");
        }
        Self::with_config(config, config_path)
    }

    /// Build the pipeline for an already loaded configuration.
    pub fn with_config(config: AppConfig, config_path: PathBuf) -> Result<Self> {
        let platform = Platform::current()?;

        let translator: Arc<dyn CommandTranslator> = Arc::from(translator_for(platform, &config.print)?);
        let chromium = config
            .render
            .chromium_path
            .clone()
            .unwrap_or_else(|| default_chromium_binary(platform));
        let renderer = ChromiumRenderer::new(chromium).with_temp_dir(config.print.temp_dir.clone());

        let resolver = ContentResolver::new(Arc::new(renderer)).with_timeout(config.render.timeout());
        let executor = PrintExecutor::new(translator)
            .with_temp_dir(config.print.temp_dir.clone())
            .with_timeout(config.print.timeout());
        let coordinator = BatchCoordinator::new(resolver, executor).into_shared();
        let session = Arc::new(SessionContext::new(Arc::new(SystemPrinterDirectory::new(platform))));

        info!(?platform, "app services initialised");
        Ok(Self {
            config,
            config_path,
            platform,
            coordinator,
            session,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Mutable access for command-line overrides; not persisted.
    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Spawn the UI channel service (which owns the HTTP server) and return
    /// its handle. Must be called inside a Tokio runtime.
    pub fn spawn_channel(&self) -> ChannelHandle {
        let server = PrintServer::new(router(HttpState {
            coordinator: Arc::clone(&self.coordinator),
            session: Arc::clone(&self.session),
        }));
        let (service, handle) =
            ChannelService::new(server, Arc::clone(&self.coordinator), Arc::clone(&self.session));
        tokio::spawn(service.run());
        handle
    }

    /// Start the server when the configuration asks for it.
    ///
    /// Returns the resulting state. A failed start is logged and leaves the
    /// server stopped; the operator can start it later.
    pub async fn autostart(&self, handle: &ChannelHandle) -> ServerStatus {
        let server = &self.config.server;
        if !server.autostart || server.ip.is_empty() || server.port == 0 {
            info!(autostart = server.autostart, "server autostart skipped");
            return ServerStatus::Stopped;
        }

        let started = match server.https.resolve() {
            Ok(https) => handle.start_server(&server.ip, server.port, https).await,
            Err(e) => Err(e),
        };
        match started {
            Ok(status) => status,
            Err(e) => {
                error!(ip = %server.ip, port = server.port, error = %e, "server autostart failed");
                ServerStatus::Stopped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::init(dir.path(), None).unwrap();

        let written = dir.path().join("config.json");
        assert!(written.exists());
        assert_eq!(services.config_path(), written);
        assert_eq!(services.config(), &AppConfig::default());
    }

    #[test]
    fn broken_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppServices::init(dir.path(), Some(&path)).is_err());
    }

    #[tokio::test]
    async fn autostart_binds_configured_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server.ip = "127.0.0.1".into();
        config.server.port = 0;
        let services = AppServices::with_config(config, dir.path().join("config.json")).unwrap();
        let handle = services.spawn_channel();

        // Port 0 means "not configured" for autostart.
        assert_eq!(services.autostart(&handle).await, ServerStatus::Stopped);

        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let mut services = services;
        services.config_mut().server.port = port;
        assert_eq!(services.autostart(&handle).await, ServerStatus::Running);
        assert_eq!(handle.stop_server().await.unwrap(), ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn autostart_disabled_or_unusable_https_stays_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.server.autostart = false;
        let mut services = AppServices::with_config(config, dir.path().join("config.json")).unwrap();
        let handle = services.spawn_channel();
        assert_eq!(services.autostart(&handle).await, ServerStatus::Stopped);

        let server = &mut services.config_mut().server;
        server.autostart = true;
        server.ip = "127.0.0.1".into();
        server.https.use_https = true;
        assert_eq!(services.autostart(&handle).await, ServerStatus::Stopped);
        assert_eq!(handle.get_server_state().await.unwrap(), ServerStatus::Stopped);
    }
}

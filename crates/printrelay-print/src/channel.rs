// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process request channel between the UI collaborator and the core.
//
// Each request carries a oneshot responder and gets exactly one reply.  The
// service loop owns the `PrintServer`, so start/stop/state requests are
// handled strictly one after another.  Print and printer lookups are spawned
// so a slow job never holds up lifecycle requests.  Every request registers
// the UI session.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument};

use printrelay_core::error::{PrintRelayError, Result};
use printrelay_core::types::{
    HttpsSettings, JobResult, NetworkInterface, PrintJob, PrintSettings, ServerStatus,
};

use crate::batch::BatchCoordinator;
use crate::server::PrintServer;
use crate::session::SessionContext;

const CHANNEL_CAPACITY: usize = 32;

/// A request from the UI, answered on `respond_to`.
#[derive(Debug)]
pub enum UiRequest {
    GetPrinters {
        respond_to: oneshot::Sender<Result<Vec<String>>>,
    },
    Print {
        url: String,
        printer: String,
        settings: PrintSettings,
        respond_to: oneshot::Sender<JobResult>,
    },
    GetNetworkInterfaces {
        respond_to: oneshot::Sender<Result<Vec<NetworkInterface>>>,
    },
    StartServer {
        hostname: String,
        port: u16,
        https: HttpsSettings,
        respond_to: oneshot::Sender<Result<ServerStatus>>,
    },
    StopServer {
        respond_to: oneshot::Sender<ServerStatus>,
    },
    GetServerState {
        respond_to: oneshot::Sender<ServerStatus>,
    },
}

/// Host network interfaces, for choosing a bind address.
pub fn network_interfaces() -> Result<Vec<NetworkInterface>> {
    let interfaces = if_addrs::get_if_addrs()?;
    Ok(interfaces
        .into_iter()
        .map(|iface| NetworkInterface {
            loopback: iface.is_loopback(),
            address: iface.ip(),
            name: iface.name,
        })
        .collect())
}

/// Serves UI requests until every handle is dropped.
pub struct ChannelService {
    requests: mpsc::Receiver<UiRequest>,
    server: PrintServer,
    coordinator: Arc<BatchCoordinator>,
    session: Arc<SessionContext>,
}

impl ChannelService {
    pub fn new(
        server: PrintServer,
        coordinator: Arc<BatchCoordinator>,
        session: Arc<SessionContext>,
    ) -> (Self, ChannelHandle) {
        let (tx, requests) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = ChannelHandle {
            tx,
            status: server.subscribe(),
        };
        let service = Self {
            requests,
            server,
            coordinator,
            session,
        };
        (service, handle)
    }

    /// Run the request loop. Stops the server once the last handle is gone.
    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.session.register();
            self.handle(request).await;
        }
        self.server.stop().await;
        info!("UI channel closed");
    }

    async fn handle(&mut self, request: UiRequest) {
        match request {
            UiRequest::GetPrinters { respond_to } => {
                let session = Arc::clone(&self.session);
                tokio::spawn(async move {
                    let _ = respond_to.send(session.printers_for_ui().await);
                });
            }
            UiRequest::Print {
                url,
                printer,
                settings,
                respond_to,
            } => {
                let coordinator = Arc::clone(&self.coordinator);
                tokio::spawn(async move {
                    let job = PrintJob::from_url(url, printer, settings);
                    let _ = respond_to.send(coordinator.print_one(&job).await);
                });
            }
            UiRequest::GetNetworkInterfaces { respond_to } => {
                let _ = respond_to.send(network_interfaces());
            }
            UiRequest::StartServer {
                hostname,
                port,
                https,
                respond_to,
            } => {
                let result = self.server.start(&hostname, port, &https).await;
                let _ = respond_to.send(result.map(|_| self.server.status()));
            }
            UiRequest::StopServer { respond_to } => {
                let _ = respond_to.send(self.server.stop().await);
            }
            UiRequest::GetServerState { respond_to } => {
                let _ = respond_to.send(self.server.status());
            }
        }
    }
}

/// Cloneable client side of the UI channel.
#[derive(Clone)]
pub struct ChannelHandle {
    tx: mpsc::Sender<UiRequest>,
    status: watch::Receiver<ServerStatus>,
}

impl ChannelHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> UiRequest) -> Result<T> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(make(respond_to))
            .await
            .map_err(|_| PrintRelayError::ChannelClosed)?;
        response.await.map_err(|_| PrintRelayError::ChannelClosed)
    }

    pub async fn get_printers(&self) -> Result<Vec<String>> {
        self.request(|respond_to| UiRequest::GetPrinters { respond_to })
            .await?
    }

    #[instrument(skip(self, settings))]
    pub async fn print(&self, url: &str, printer: &str, settings: PrintSettings) -> Result<JobResult> {
        self.request(|respond_to| UiRequest::Print {
            url: url.to_owned(),
            printer: printer.to_owned(),
            settings,
            respond_to,
        })
        .await
    }

    pub async fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>> {
        self.request(|respond_to| UiRequest::GetNetworkInterfaces { respond_to })
            .await?
    }

    pub async fn start_server(&self, hostname: &str, port: u16, https: HttpsSettings) -> Result<ServerStatus> {
        debug!(hostname, port, https = https.use_https, "start requested over UI channel");
        self.request(|respond_to| UiRequest::StartServer {
            hostname: hostname.to_owned(),
            port,
            https,
            respond_to,
        })
        .await?
    }

    pub async fn stop_server(&self) -> Result<ServerStatus> {
        self.request(|respond_to| UiRequest::StopServer { respond_to })
            .await
    }

    pub async fn get_server_state(&self) -> Result<ServerStatus> {
        self.request(|respond_to| UiRequest::GetServerState { respond_to })
            .await
    }

    /// Server state changes pushed as they happen.
    pub fn subscribe_server_state(&self) -> watch::Receiver<ServerStatus> {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;
    use crate::http::{HttpState, router};
    use crate::testing::Harness;

    fn spawn_service(harness: &Harness) -> ChannelHandle {
        let server = PrintServer::new(router(HttpState {
            coordinator: harness.coordinator.clone(),
            session: harness.session.clone(),
        }));
        let (service, handle) =
            ChannelService::new(server, harness.coordinator.clone(), harness.session.clone());
        tokio::spawn(service.run());
        handle
    }

    #[tokio::test]
    async fn server_lifecycle_over_the_channel() {
        let harness = Harness::new();
        let handle = spawn_service(&harness);
        let mut states = handle.subscribe_server_state();

        assert_eq!(handle.get_server_state().await.unwrap(), ServerStatus::Stopped);

        let status = handle
            .start_server("127.0.0.1", 0, HttpsSettings::plain())
            .await
            .unwrap();
        assert_eq!(status, ServerStatus::Running);
        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), ServerStatus::Running);

        let again = handle.start_server("127.0.0.1", 0, HttpsSettings::plain()).await;
        assert!(matches!(again, Err(PrintRelayError::ServerAlreadyRunning)));

        assert_eq!(handle.stop_server().await.unwrap(), ServerStatus::Stopped);
        assert_eq!(handle.get_server_state().await.unwrap(), ServerStatus::Stopped);
        assert_eq!(handle.stop_server().await.unwrap(), ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn any_request_registers_the_ui_session() {
        let harness = Harness::new();
        let handle = spawn_service(&harness);
        assert!(!harness.session.is_registered());

        handle.get_server_state().await.unwrap();
        assert!(harness.session.is_registered());
        assert_eq!(handle.get_printers().await.unwrap(), vec!["P1", "P2"]);
    }

    #[tokio::test]
    async fn print_renders_and_prints_one_job() {
        let harness = Harness::new();
        let handle = spawn_service(&harness);
        let settings = PrintSettings {
            copies: NonZeroU32::new(2),
            ..Default::default()
        };

        let result = handle.print("https://a", "P1", settings).await.unwrap();
        assert_eq!(result, JobResult::ok());

        let (args, document) = harness.runner.invocation_for("P1").unwrap();
        assert_eq!(&args[..2], &["-n", "2"]);
        assert_eq!(document, b"https://a");
    }

    #[tokio::test]
    async fn network_interfaces_include_loopback() {
        let harness = Harness::new();
        let handle = spawn_service(&harness);
        let interfaces = handle.get_network_interfaces().await.unwrap();
        assert!(interfaces.iter().any(|i| i.loopback));
    }

    #[tokio::test]
    async fn requests_fail_once_the_service_is_gone() {
        let harness = Harness::new();
        let server = PrintServer::new(router(HttpState {
            coordinator: harness.coordinator.clone(),
            session: harness.session.clone(),
        }));
        let (service, handle) =
            ChannelService::new(server, harness.coordinator.clone(), harness.session.clone());
        drop(service);

        assert!(matches!(
            handle.get_server_state().await,
            Err(PrintRelayError::ChannelClosed)
        ));
    }
}

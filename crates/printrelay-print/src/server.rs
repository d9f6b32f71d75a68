// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print server lifecycle: bind, accept, track connections, force-close.
//
//   stopped --start--> running --stop--> stopped
//
// Stopping aborts every open connection first, then closes the listener, and
// only then reports `stopped`, so a following start can re-bind the port.
// Print batches run on their own tasks, so an aborted connection only loses
// its reply.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_rustls::TlsAcceptor;
use tower::Service;
use tracing::{debug, error, info, instrument, warn};

use printrelay_core::error::{PrintRelayError, Result};
use printrelay_core::types::{HttpsSettings, ServerStatus};

use crate::tls;

/// The HTTP(S) listener serving the print API.
pub struct PrintServer {
    /// Routes served on every connection.
    router: Router,
    /// Publishes every lifecycle transition.
    status_tx: watch::Sender<ServerStatus>,
    /// Present exactly while the server is running.
    running: Option<RunningListener>,
}

struct RunningListener {
    local_addr: SocketAddr,
    /// Signals the accept loop to drain and exit.
    shutdown: Arc<Notify>,
    /// The accept loop; owns the listener and every connection task.
    accept_task: JoinHandle<()>,
    /// Number of currently open connections.
    open: Arc<AtomicUsize>,
}

impl PrintServer {
    /// Create a server in the `stopped` state.
    pub fn new(router: Router) -> Self {
        let (status_tx, _) = watch::channel(ServerStatus::Stopped);
        Self {
            router,
            status_tx,
            running: None,
        }
    }

    pub fn status(&self) -> ServerStatus {
        *self.status_tx.borrow()
    }

    /// Receive every future state change.
    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.status_tx.subscribe()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    pub fn open_connections(&self) -> usize {
        self.running
            .as_ref()
            .map_or(0, |r| r.open.load(Ordering::SeqCst))
    }

    /// Bind `hostname:port` (TLS when `https.use_https`) and start accepting.
    ///
    /// # Errors
    ///
    /// `ServerAlreadyRunning` if a listener is active; `Tls` for unusable
    /// certificate material; `ServerBind` if the address cannot be bound.
    /// The server stays `stopped` on every error.
    #[instrument(skip(self, https), fields(https = https.use_https))]
    pub async fn start(&mut self, hostname: &str, port: u16, https: &HttpsSettings) -> Result<SocketAddr> {
        if self.running.is_some() {
            warn!("start requested while already running");
            return Err(PrintRelayError::ServerAlreadyRunning);
        }

        let acceptor = if https.use_https {
            Some(tls::acceptor(https)?)
        } else {
            None
        };

        let addr = format!("{hostname}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| PrintRelayError::ServerBind {
                addr: addr.clone(),
                message: e.to_string(),
            })?;
        let local_addr = listener.local_addr()?;

        let shutdown = Arc::new(Notify::new());
        let open = Arc::new(AtomicUsize::new(0));
        let accept_task = tokio::spawn(accept_loop(
            listener,
            acceptor,
            self.router.clone(),
            Arc::clone(&shutdown),
            Arc::clone(&open),
        ));

        self.running = Some(RunningListener {
            local_addr,
            shutdown,
            accept_task,
            open,
        });
        self.status_tx.send_replace(ServerStatus::Running);
        info!(%local_addr, "print server listening");
        Ok(local_addr)
    }

    /// Force-close every connection, close the listener, report `stopped`.
    /// A no-op on a stopped server apart from re-reporting the state.
    pub async fn stop(&mut self) -> ServerStatus {
        if let Some(running) = self.running.take() {
            info!(addr = %running.local_addr, "stopping print server");
            running.shutdown.notify_one();
            if let Err(e) = running.accept_task.await {
                error!(error = %e, "accept loop did not shut down cleanly");
            }
            info!(addr = %running.local_addr, "print server stopped");
        }
        self.status_tx.send_replace(ServerStatus::Stopped);
        ServerStatus::Stopped
    }
}

/// Accept until shutdown, then abort all connections before dropping the
/// listener.
async fn accept_loop(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    router: Router,
    shutdown: Arc<Notify>,
    open: Arc<AtomicUsize>,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!("accept loop received shutdown signal");
                break;
            }

            Some(_) = connections.join_next(), if !connections.is_empty() => {
                open.store(connections.len(), Ordering::SeqCst);
            }

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "connection accepted");
                    connections.spawn(serve_connection(stream, peer, acceptor.clone(), router.clone()));
                    open.store(connections.len(), Ordering::SeqCst);
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            },
        }
    }

    let closing = connections.len();
    connections.abort_all();
    while connections.join_next().await.is_some() {}
    open.store(0, Ordering::SeqCst);
    drop(listener);
    debug!(closed = closing, "connections closed, listener released");
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, acceptor: Option<TlsAcceptor>, router: Router) {
    let served = match acceptor {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(tls_stream) => serve_http(tls_stream, router).await,
            Err(e) => {
                debug!(%peer, error = %e, "TLS handshake failed");
                return;
            }
        },
        None => serve_http(stream, router).await,
    };
    if let Err(e) = served {
        debug!(%peer, error = %e, "connection ended with error");
    }
}

async fn serve_http<I>(io: I, router: Router) -> std::result::Result<(), hyper::Error>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
        router.clone().call(request)
    });
    hyper::server::conn::http1::Builder::new()
        .serve_connection(TokioIo::new(io), service)
        .await
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTPS server hosting the admission endpoint

use super::routes::handle;
use super::Injector;
use crate::kubernetes::NamespaceLookup;
use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

pub struct WebhookServer<L> {
    injector: Arc<Injector<L>>,
    acceptor: TlsAcceptor,
    shutdown_timeout: Duration,
}

impl<L: NamespaceLookup + 'static> WebhookServer<L> {
    pub fn new(injector: Injector<L>, acceptor: TlsAcceptor, shutdown_timeout: Duration) -> Self {
        Self {
            injector: Arc::new(injector),
            acceptor,
            shutdown_timeout,
        }
    }

    /// Serve admission requests until SIGINT or SIGTERM, then drain open connections
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind webhook port {}", addr))?;
        info!("Webhook server listening on {}", addr);

        let graceful = GracefulShutdown::new();
        let mut shutdown = std::pin::pin!(shutdown_signal());

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!("Error accepting connection: {}", e);
                            continue;
                        }
                    };

                    let acceptor = self.acceptor.clone();
                    let injector = self.injector.clone();
                    let watcher = graceful.watcher();

                    tokio::spawn(async move {
                        let stream = match acceptor.accept(stream).await {
                            Ok(stream) => stream,
                            Err(e) => {
                                debug!("TLS handshake with {} failed: {}", peer, e);
                                return;
                            }
                        };

                        let service = service_fn(move |req| {
                            let injector = injector.clone();
                            async move {
                                let response = handle(&*injector, req).await;
                                Ok::<_, Infallible>(response)
                            }
                        });
                        let io = TokioIo::new(stream);
                        let conn = http1::Builder::new().serve_connection(io, service);

                        if let Err(e) = watcher.watch(conn).await {
                            debug!("Connection from {} closed with error: {}", peer, e);
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Got OS shutdown signal, shutting down webhook server gracefully");
                    break;
                }
            }
        }

        drop(listener);

        let timeout = self.shutdown_timeout;
        tokio::select! {
            _ = graceful.shutdown() => info!("All connections closed"),
            _ = tokio::time::sleep(timeout) => {
                warn!("Timed out after {:?} waiting for connections to close", timeout);
            }
        }

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sigv4_proxy_injector::config::Config;
use sigv4_proxy_injector::kubernetes::KubeNamespaceLookup;
use sigv4_proxy_injector::webhook::{load_tls_acceptor, Injector, WebhookServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("Starting SigV4 proxy injector");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded: port={}, proxy_image={}",
        config.port, config.proxy_image
    );

    let acceptor = load_tls_acceptor(&config.tls_cert_file, &config.tls_key_file)
        .context("Failed to load webhook TLS key pair")?;

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let injector = Injector::new(KubeNamespaceLookup::new(client), config.injector_config());

    WebhookServer::new(injector, acceptor, config.shutdown_timeout())
        .run(config.listen_addr())
        .await?;

    info!("Webhook server stopped");
    Ok(())
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::sidecar::DEFAULT_IMAGE;
use crate::resolver::NamespaceSelector;
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Webhook server configuration, read from flags or environment variables
#[derive(Debug, Clone, Parser)]
#[command(name = "sigv4-proxy-injector", version, about)]
pub struct Config {
    /// Webhook server port
    #[arg(long, env = "WEBHOOK_PORT", default_value_t = 443)]
    pub port: u16,

    /// File containing the x509 certificate chain for HTTPS
    #[arg(
        long,
        alias = "tlsCertFile",
        env = "TLS_CERT_FILE",
        default_value = "/etc/webhook/certs/cert.pem"
    )]
    pub tls_cert_file: PathBuf,

    /// File containing the x509 private key matching --tls-cert-file
    #[arg(
        long,
        alias = "tlsKeyFile",
        env = "TLS_KEY_FILE",
        default_value = "/etc/webhook/certs/key.pem"
    )]
    pub tls_key_file: PathBuf,

    /// Image of the injected signing proxy
    // Dashed variable name kept for existing deployments
    #[arg(long, env = "AWS-SIGV4-PROXY-IMAGE", default_value = DEFAULT_IMAGE)]
    pub proxy_image: String,

    /// Upper bound on a single namespace lookup
    #[arg(long, env = "NAMESPACE_LOOKUP_TIMEOUT_SECS", default_value_t = 10)]
    pub lookup_timeout_secs: u64,

    /// How long in-flight requests may take to finish on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from command line flags, falling back to the environment
    pub fn load() -> Result<Self> {
        let config = Config::try_parse().context("Invalid webhook configuration")?;

        if config.proxy_image.trim().is_empty() {
            anyhow::bail!("Proxy image must not be empty");
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// The immutable injection settings shared by every admission request
    pub fn injector_config(&self) -> InjectorConfig {
        InjectorConfig {
            namespace_selector: NamespaceSelector::default(),
            proxy_image: self.proxy_image.clone(),
            lookup_timeout: self.lookup_timeout(),
        }
    }
}

/// Values fixed at startup and injected into the [`crate::webhook::Injector`]
#[derive(Debug, Clone)]
pub struct InjectorConfig {
    pub namespace_selector: NamespaceSelector,
    pub proxy_image: String,
    pub lookup_timeout: Duration,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            namespace_selector: NamespaceSelector::default(),
            proxy_image: DEFAULT_IMAGE.to_string(),
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

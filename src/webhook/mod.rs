// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Mutating admission webhook injecting the AWS SigV4 signing proxy.

pub mod injector;
pub mod routes;
pub mod server;
pub mod tls;

pub use injector::{build_pod_patch, Injector};
pub use server::WebhookServer;
pub use tls::load_tls_acceptor;

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace label lookup

use crate::error::{InjectorError, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{debug, instrument};

/// Source of the current label set of a namespace
pub trait NamespaceLookup: Send + Sync {
    fn namespace_labels(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<BTreeMap<String, String>>> + Send;
}

/// Looks namespaces up through the Kubernetes API on every call
#[derive(Clone)]
pub struct KubeNamespaceLookup {
    client: Client,
}

impl KubeNamespaceLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl NamespaceLookup for KubeNamespaceLookup {
    #[instrument(skip(self))]
    async fn namespace_labels(&self, namespace: &str) -> Result<BTreeMap<String, String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        match namespaces.get(namespace).await {
            Ok(ns) => {
                let labels = ns.metadata.labels.unwrap_or_default();
                debug!("Namespace {} labels: {:?}", namespace, labels);
                Ok(labels)
            }
            Err(kube::Error::Api(err)) if err.code == 404 => Err(InjectorError::NamespaceLookup {
                namespace: namespace.to_string(),
                reason: "namespace not found".to_string(),
            }),
            Err(e) => Err(InjectorError::NamespaceLookup {
                namespace: namespace.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

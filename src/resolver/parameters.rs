// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Upstream endpoint, role and resource parameters for the proxy sidecar

use super::{get_resource_requirements, non_blank};
use crate::constants::{annotations, labels};
use crate::error::{InjectorError, Result};
use k8s_openapi::api::core::v1::ResourceRequirements;
use std::collections::BTreeMap;

/// Endpoint the proxy forwards signed requests to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoint {
    pub host: String,
    pub name: String,
    pub region: String,
}

/// Everything needed to build the sidecar container for one pod
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    pub host: String,
    pub name: String,
    pub region: String,
    /// Empty when no role should be assumed
    pub role_arn: String,
    pub resources: Option<ResourceRequirements>,
}

impl ResolvedParameters {
    pub fn resolve(
        namespace_labels: &BTreeMap<String, String>,
        pod_annotations: Option<&BTreeMap<String, String>>,
    ) -> Result<Self> {
        let UpstreamEndpoint { host, name, region } =
            get_upstream_endpoint_parameters(namespace_labels, pod_annotations)?;

        Ok(Self {
            host,
            name,
            region,
            role_arn: get_role_arn(namespace_labels, pod_annotations),
            resources: get_resource_requirements(pod_annotations)?,
        })
    }
}

/// Resolve host, signing name and region.
///
/// A non-blank host annotation selects the pod annotations as the only source
/// for all three values; otherwise the namespace labels are used. Values are
/// never mixed across the two sources. Having no host on either side is an
/// error.
pub fn get_upstream_endpoint_parameters(
    namespace_labels: &BTreeMap<String, String>,
    pod_annotations: Option<&BTreeMap<String, String>>,
) -> Result<UpstreamEndpoint> {
    match non_blank(pod_annotations, annotations::HOST) {
        Some(host) => extract_parameters(
            host,
            non_blank(pod_annotations, annotations::NAME),
            non_blank(pod_annotations, annotations::REGION),
        ),
        None => {
            let namespace_labels = Some(namespace_labels);
            let host = non_blank(namespace_labels, labels::HOST)
                .ok_or(InjectorError::MissingHost)?;
            extract_parameters(
                host,
                non_blank(namespace_labels, labels::NAME),
                non_blank(namespace_labels, labels::REGION),
            )
        }
    }
}

/// Fill in a missing name or region from the host.
///
/// For `es.us-east-1.amazonaws.com` the name defaults to `es` and the region to
/// `us-east-1`. A host lacking the required segment is rejected.
fn extract_parameters(
    host: &str,
    name: Option<&str>,
    region: Option<&str>,
) -> Result<UpstreamEndpoint> {
    let name = match name {
        Some(name) => name,
        None => host_segment(host, 0)?,
    };

    let region = match region {
        Some(region) => region,
        None => host_segment(host, 1)?,
    };

    Ok(UpstreamEndpoint {
        host: host.to_string(),
        name: name.to_string(),
        region: region.to_string(),
    })
}

/// The `index`-th dot separated segment of `host`, which must be followed by a dot
fn host_segment(host: &str, index: usize) -> Result<&str> {
    let mut segments = host.splitn(index + 2, '.');

    match (segments.nth(index), segments.next()) {
        (Some(segment), Some(_)) if !segment.trim().is_empty() => Ok(segment),
        _ => Err(InjectorError::MalformedHost(host.to_string())),
    }
}

/// Role ARN from the pod annotation, falling back to the namespace label.
/// Empty when neither is set.
pub fn get_role_arn(
    namespace_labels: &BTreeMap<String, String>,
    pod_annotations: Option<&BTreeMap<String, String>>,
) -> String {
    non_blank(pod_annotations, annotations::ROLE_ARN)
        .or_else(|| non_blank(Some(namespace_labels), labels::ROLE_ARN))
        .unwrap_or_default()
        .to_string()
}

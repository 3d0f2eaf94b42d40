// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Injection decision and sidecar parameter resolution.
//!
//! Two configuration sources feed every decision: the pod's annotations and
//! the labels of the namespace the pod is created in. Pod annotations win.

pub mod decision;
pub mod parameters;
pub mod resources;
pub mod selector;

use std::collections::BTreeMap;

pub use decision::{should_mutate, InjectFlag};
pub use parameters::{
    get_role_arn, get_upstream_endpoint_parameters, ResolvedParameters, UpstreamEndpoint,
};
pub use resources::{get_resource_requirements, parse_quantity};
pub use selector::NamespaceSelector;

/// Returns the trimmed value of `key` if it is present and not blank
pub(crate) fn non_blank<'a>(
    map: Option<&'a BTreeMap<String, String>>,
    key: &str,
) -> Option<&'a str> {
    map.and_then(|m| m.get(key))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

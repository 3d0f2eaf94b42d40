// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Whether a pod gets the signing proxy injected

use super::{non_blank, NamespaceSelector};
use crate::constants::{annotations, labels};
use std::collections::BTreeMap;

/// Explicit pod-level signal carried by the inject annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectFlag {
    Accept,
    Reject,
    /// Absent, empty or unrecognised value
    Unset,
}

impl InjectFlag {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.to_lowercase()).as_deref() {
            Some("y" | "yes" | "true" | "on") => InjectFlag::Accept,
            Some("n" | "no" | "false" | "off") => InjectFlag::Reject,
            _ => InjectFlag::Unset,
        }
    }

    pub fn from_annotations(pod_annotations: Option<&BTreeMap<String, String>>) -> Self {
        Self::parse(
            pod_annotations
                .and_then(|a| a.get(annotations::INJECT))
                .map(String::as_str),
        )
    }
}

/// Check if the pod was already mutated by a previous admission call
pub fn is_injected(pod_annotations: Option<&BTreeMap<String, String>>) -> bool {
    pod_annotations
        .and_then(|a| a.get(annotations::STATUS))
        .is_some_and(|v| v == annotations::STATUS_INJECTED)
}

/// Decide whether the sidecar should be added to a pod.
///
/// A pod is mutated when it has not been mutated before, an upstream host is
/// set on either the pod or its namespace, and either the namespace selector
/// grants injection without the pod opting out, or the pod opts in itself.
pub fn should_mutate(
    selector: &NamespaceSelector,
    namespace_labels: &BTreeMap<String, String>,
    pod_annotations: Option<&BTreeMap<String, String>>,
) -> bool {
    if is_injected(pod_annotations) {
        return false;
    }

    if non_blank(pod_annotations, annotations::HOST).is_none()
        && non_blank(Some(namespace_labels), labels::HOST).is_none()
    {
        return false;
    }

    let flag = InjectFlag::from_annotations(pod_annotations);
    let namespace_grants = selector.matches(namespace_labels);

    (namespace_grants && flag != InjectFlag::Reject) || flag == InjectFlag::Accept
}

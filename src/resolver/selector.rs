// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace label selector matching

use crate::constants::labels;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use std::collections::BTreeMap;

/// Selector deciding whether a namespace grants injection to its pods
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceSelector(LabelSelector);

impl NamespaceSelector {
    pub fn new(selector: LabelSelector) -> Self {
        Self(selector)
    }

    /// An empty selector never matches; namespaces have to opt in explicitly
    pub fn is_empty(&self) -> bool {
        let LabelSelector {
            match_labels,
            match_expressions,
        } = &self.0;

        match_labels.iter().all(|m| m.is_empty()) && match_expressions.iter().all(|e| e.is_empty())
    }

    pub fn matches(&self, namespace_labels: &BTreeMap<String, String>) -> bool {
        if self.is_empty() {
            return false;
        }

        let LabelSelector {
            match_labels,
            match_expressions,
        } = &self.0;

        let labels_match = match_labels
            .iter()
            .flatten()
            .all(|(key, value)| namespace_labels.get(key) == Some(value));
        let expressions_match = match_expressions
            .iter()
            .flatten()
            .all(|expr| requirement_matches(expr, namespace_labels));

        labels_match && expressions_match
    }
}

impl Default for NamespaceSelector {
    fn default() -> Self {
        Self(LabelSelector {
            match_labels: Some(BTreeMap::from([(
                labels::INJECT.to_string(),
                "true".to_string(),
            )])),
            match_expressions: None,
        })
    }
}

fn requirement_matches(expr: &LabelSelectorRequirement, labels: &BTreeMap<String, String>) -> bool {
    let value = labels.get(&expr.key);
    let values = expr.values.as_deref().unwrap_or_default();

    match expr.operator.as_str() {
        "In" => value.is_some_and(|v| values.contains(v)),
        "NotIn" => value.map_or(true, |v| !values.contains(v)),
        "Exists" => value.is_some(),
        "DoesNotExist" => value.is_none(),
        // Unknown operators never match
        _ => false,
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! JSON Patch (RFC 6902) operations applied to admitted pods

use crate::constants::sidecar::ANNOTATIONS_PATH;
use crate::error::Result;
use k8s_openapi::api::core::v1::Container;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value,
        }
    }
}

/// Append containers to the array at `base_path`.
///
/// JSON Patch cannot append to an array that does not exist, so when `target`
/// is empty the first container is added as a one-element array at
/// `base_path` itself; the remaining ones are appended with `/-`.
pub fn add_containers(
    target: &[Container],
    containers: &[Container],
    base_path: &str,
) -> Result<Vec<PatchOperation>> {
    let mut first = target.is_empty();
    let mut patch = Vec::with_capacity(containers.len());

    for container in containers {
        let operation = if first {
            first = false;
            PatchOperation::add(base_path, serde_json::to_value([container])?)
        } else {
            PatchOperation::add(format!("{base_path}/-"), serde_json::to_value(container)?)
        };
        patch.push(operation);
    }

    Ok(patch)
}

/// Set annotations on the pod, adding keys that are missing or blank and
/// replacing the others.
///
/// A pod without any annotations gets the whole map added in one operation,
/// since members cannot be added to a missing object.
pub fn update_annotations(
    target: Option<&BTreeMap<String, String>>,
    annotations: &BTreeMap<String, String>,
) -> Vec<PatchOperation> {
    let Some(target) = target else {
        if annotations.is_empty() {
            return Vec::new();
        }
        let object = annotations
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        return vec![PatchOperation::add(ANNOTATIONS_PATH, Value::Object(object))];
    };

    annotations
        .iter()
        .map(|(key, value)| {
            let path = format!("{ANNOTATIONS_PATH}/{}", escape_json_pointer(key));
            let value = Value::String(value.clone());

            if target.get(key).map_or(true, |v| v.is_empty()) {
                PatchOperation::add(path, value)
            } else {
                PatchOperation::replace(path, value)
            }
        })
        .collect()
}

/// Escape a single JSON pointer reference token (RFC 6901)
pub fn escape_json_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Convert the operations into the patch type carried by admission responses
pub fn into_json_patch(operations: &[PatchOperation]) -> Result<json_patch::Patch> {
    Ok(serde_json::from_value(serde_json::to_value(operations)?)?)
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CPU and memory hints for the sidecar, taken from pod annotations

use crate::constants::annotations;
use crate::error::{InjectorError, Result};
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SUFFIXES: [&str; 9] = ["n", "u", "m", "k", "M", "G", "T", "P", "E"];

/// Build the sidecar's resource requirements.
///
/// Returns `None` when none of the four resource annotations is set.
pub fn get_resource_requirements(
    pod_annotations: Option<&BTreeMap<String, String>>,
) -> Result<Option<ResourceRequirements>> {
    let Some(pod_annotations) = pod_annotations else {
        return Ok(None);
    };

    let requests = quantities(
        pod_annotations,
        annotations::CPU_REQUEST,
        annotations::MEMORY_REQUEST,
    )?;
    let limits = quantities(
        pod_annotations,
        annotations::CPU_LIMIT,
        annotations::MEMORY_LIMIT,
    )?;

    if requests.is_none() && limits.is_none() {
        return Ok(None);
    }

    Ok(Some(ResourceRequirements {
        requests,
        limits,
        ..Default::default()
    }))
}

fn quantities(
    pod_annotations: &BTreeMap<String, String>,
    cpu_key: &str,
    memory_key: &str,
) -> Result<Option<BTreeMap<String, Quantity>>> {
    let mut resources = BTreeMap::new();

    for (resource, key) in [("cpu", cpu_key), ("memory", memory_key)] {
        let Some(value) = pod_annotations.get(key) else {
            continue;
        };
        let Some(quantity) = parse_quantity(value) else {
            return Err(InjectorError::InvalidQuantity {
                annotation: key.to_string(),
                value: value.clone(),
            });
        };
        resources.insert(resource.to_string(), quantity);
    }

    Ok((!resources.is_empty()).then_some(resources))
}

/// Validate a Kubernetes quantity such as `250m`, `1.5`, `128Mi` or `1e3`
pub fn parse_quantity(value: &str) -> Option<Quantity> {
    let value = value.trim();

    let number = BINARY_SUFFIXES
        .iter()
        .chain(DECIMAL_SUFFIXES.iter())
        .find_map(|suffix| value.strip_suffix(suffix))
        .or_else(|| strip_exponent(value))
        .unwrap_or(value);

    let valid = is_signed_number(number);

    valid.then(|| Quantity(value.to_string()))
}

/// Strip an `e<int>`/`E<int>` exponent, returning the mantissa
fn strip_exponent(value: &str) -> Option<&str> {
    let (mantissa, exponent) = value.split_once(['e', 'E'])?;
    let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);

    let valid = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());

    valid.then_some(mantissa)
}

fn is_signed_number(number: &str) -> bool {
    let unsigned = number.strip_prefix(['+', '-']).unwrap_or(number);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    (!whole.is_empty() || !fraction.is_empty()) && all_digits(whole) && all_digits(fraction)
}

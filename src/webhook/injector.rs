// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Admission decision for a single pod

use crate::config::InjectorConfig;
use crate::constants::{annotations, sidecar::CONTAINERS_PATH};
use crate::error::{InjectorError, Result};
use crate::kubernetes::NamespaceLookup;
use crate::patch::{add_containers, into_json_patch, update_annotations, PatchOperation};
use crate::resolver::{should_mutate, ResolvedParameters};
use crate::sidecar::sidecar_container;
use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::DynamicObject;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Mutating admission logic, shared by all connections
pub struct Injector<L> {
    lookup: L,
    config: InjectorConfig,
}

impl<L: NamespaceLookup> Injector<L> {
    pub fn new(lookup: L, config: InjectorConfig) -> Self {
        Self { lookup, config }
    }

    /// Admit a pod, adding the signing proxy when it applies.
    ///
    /// Pods are always allowed unless their parameters cannot be resolved, in
    /// which case the request is denied with the reason.
    #[instrument(
        skip_all,
        fields(uid = %request.uid, namespace = ?request.namespace, name = %request.name)
    )]
    pub async fn mutate(&self, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
        match self.pod_patch(request).await {
            Ok(None) => AdmissionResponse::from(request),
            Ok(Some(operations)) => {
                let patch = match into_json_patch(&operations) {
                    Ok(patch) => patch,
                    Err(e) => return AdmissionResponse::from(request).deny(e),
                };
                match AdmissionResponse::from(request).with_patch(patch) {
                    Ok(response) => {
                        info!("Injecting signing proxy sidecar");
                        response
                    }
                    Err(e) => {
                        warn!("Failed to serialize patch: {}", e);
                        let message = format!("patch serialization error: {e}");
                        AdmissionResponse::from(request).deny(message)
                    }
                }
            }
            Err(e) => {
                warn!("Denying pod: {}", e);
                AdmissionResponse::from(request).deny(e)
            }
        }
    }

    async fn pod_patch(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<Option<Vec<PatchOperation>>> {
        let pod = decode_pod(request)?;

        let namespace = request
            .namespace
            .clone()
            .or_else(|| pod.metadata.namespace.clone())
            .ok_or_else(|| InjectorError::InvalidObject("pod has no namespace".to_string()))?;

        let namespace_labels = self.namespace_labels(&namespace).await?;
        let pod_annotations = pod.metadata.annotations.as_ref();
        let selector = &self.config.namespace_selector;

        if !should_mutate(selector, &namespace_labels, pod_annotations) {
            debug!("Pod does not require the signing proxy");
            return Ok(None);
        }

        let params = ResolvedParameters::resolve(&namespace_labels, pod_annotations)?;
        debug!(
            "Resolved upstream host={} name={} region={}",
            params.host, params.name, params.region
        );

        let operations = build_pod_patch(&pod, &params, &self.config.proxy_image)?;
        debug!("Admission patch: {}", serde_json::to_string(&operations)?);

        Ok(Some(operations))
    }

    async fn namespace_labels(&self, namespace: &str) -> Result<BTreeMap<String, String>> {
        let timeout = self.config.lookup_timeout;

        tokio::time::timeout(timeout, self.lookup.namespace_labels(namespace))
            .await
            .map_err(|_| InjectorError::LookupTimeout {
                namespace: namespace.to_string(),
                timeout,
            })?
    }
}

fn decode_pod(request: &AdmissionRequest<DynamicObject>) -> Result<Pod> {
    let object = request
        .object
        .as_ref()
        .ok_or_else(|| InjectorError::InvalidObject("request carries no object".to_string()))?;

    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|e| InjectorError::InvalidObject(format!("object is not a pod: {e}")))
}

/// Operations adding the sidecar and stamping the status annotation
pub fn build_pod_patch(
    pod: &Pod,
    params: &ResolvedParameters,
    image: &str,
) -> Result<Vec<PatchOperation>> {
    let existing = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default();

    let sidecar = sidecar_container(params, image);
    let mut operations = add_containers(existing, &[sidecar], CONTAINERS_PATH)?;

    let status = BTreeMap::from([(
        annotations::STATUS.to_string(),
        annotations::STATUS_INJECTED.to_string(),
    )]);
    let pod_annotations = pod.metadata.annotations.as_ref();
    operations.extend(update_annotations(pod_annotations, &status));

    Ok(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::labels;
    use crate::resolver::NamespaceSelector;
    use crate::test_utils::pod_json;
    use kube::core::admission::AdmissionReview;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct StaticLookup(BTreeMap<String, String>);

    impl NamespaceLookup for StaticLookup {
        async fn namespace_labels(&self, _namespace: &str) -> Result<BTreeMap<String, String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingLookup;

    impl NamespaceLookup for FailingLookup {
        async fn namespace_labels(&self, namespace: &str) -> Result<BTreeMap<String, String>> {
            Err(InjectorError::NamespaceLookup {
                namespace: namespace.to_string(),
                reason: "forbidden".to_string(),
            })
        }
    }

    struct SlowLookup;

    impl NamespaceLookup for SlowLookup {
        async fn namespace_labels(&self, _namespace: &str) -> Result<BTreeMap<String, String>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(BTreeMap::new())
        }
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn injector<L: NamespaceLookup>(lookup: L) -> Injector<L> {
        Injector::new(
            lookup,
            InjectorConfig {
                namespace_selector: NamespaceSelector::default(),
                proxy_image: "registry.local/aws-sigv4-proxy:test".to_string(),
                lookup_timeout: Duration::from_millis(50),
            },
        )
    }

    fn admission_request(object: Value) -> AdmissionRequest<DynamicObject> {
        let review: AdmissionReview<DynamicObject> = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "name": "test-pod",
                "namespace": "team-a",
                "operation": "CREATE",
                "userInfo": {"username": "admin"},
                "object": object,
                "dryRun": false
            }
        }))
        .unwrap();
        review.try_into().unwrap()
    }

    fn patch_of(response: &AdmissionResponse) -> Value {
        let patch = response.patch.as_ref().expect("response has a patch");
        serde_json::from_slice(patch).unwrap()
    }

    #[tokio::test]
    async fn test_namespace_enabled_pod_gets_sidecar() {
        let injector = injector(StaticLookup(map(&[
            (labels::INJECT, "true"),
            (labels::HOST, "es.us-east-1.amazonaws.com"),
        ])));
        let request = admission_request(pod_json("team-a", Some(&[("app", "web")]), &["app"]));

        let response = injector.mutate(&request).await;

        assert!(response.allowed);
        assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        let patch = patch_of(&response);
        let container = &patch[0]["value"];
        let args = json!([
            "--name",
            "es",
            "--region",
            "us-east-1",
            "--host",
            "es.us-east-1.amazonaws.com",
            "--port",
            ":8005"
        ]);
        let status_path = "/metadata/annotations/sidecar.aws.signing-proxy~1status";

        assert_eq!(patch[0]["op"], "add");
        assert_eq!(patch[0]["path"], "/spec/containers/-");
        assert_eq!(container["name"], "sidecar-aws-sigv4-proxy");
        assert_eq!(container["image"], "registry.local/aws-sigv4-proxy:test");
        assert_eq!(container["args"], args);
        assert_eq!(
            patch[1],
            json!({"op": "add", "path": status_path, "value": "injected"})
        );
    }

    #[tokio::test]
    async fn test_pod_without_containers_gets_container_array() {
        let injector = injector(StaticLookup(map(&[(labels::INJECT, "true")])));
        let request = admission_request(pod_json(
            "team-a",
            Some(&[(annotations::HOST, "sqs.eu-west-1.amazonaws.com")]),
            &[],
        ));

        let response = injector.mutate(&request).await;

        let patch = patch_of(&response);
        assert_eq!(patch[0]["path"], "/spec/containers");
        assert_eq!(patch[0]["value"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unselected_pod_is_allowed_unchanged() {
        let namespace = map(&[(labels::HOST, "es.us-east-1.amazonaws.com")]);
        let injector = injector(StaticLookup(namespace));
        let request = admission_request(pod_json("team-a", None, &["app"]));

        let response = injector.mutate(&request).await;

        assert!(response.allowed);
        assert!(response.patch.is_none());
    }

    #[tokio::test]
    async fn test_patched_pod_is_not_mutated_again() {
        let injector = injector(StaticLookup(map(&[
            (labels::INJECT, "true"),
            (labels::HOST, "es.us-east-1.amazonaws.com"),
        ])));

        for annotations in [None, Some(&[("app", "web")][..])] {
            let mut pod = pod_json("team-a", annotations, &["app"]);
            let response = injector.mutate(&admission_request(pod.clone())).await;
            let patch = response.patch.as_ref().unwrap();
            let patch: json_patch::Patch = serde_json::from_slice(patch).unwrap();

            json_patch::patch(&mut pod, &patch.0).unwrap();

            let containers = pod["spec"]["containers"].as_array().unwrap();
            assert_eq!(containers.len(), 2);
            let again = injector.mutate(&admission_request(pod)).await;
            assert!(again.allowed);
            assert!(again.patch.is_none());
        }
    }

    #[tokio::test]
    async fn test_role_and_resources_reach_the_container() {
        let injector = injector(StaticLookup(map(&[
            (labels::INJECT, "true"),
            (labels::HOST, "es.us-east-1.amazonaws.com"),
            (labels::ROLE_ARN, "arn:aws:iam::123456789012:role/es"),
        ])));
        let resources = [
            (annotations::CPU_REQUEST, "200m"),
            (annotations::MEMORY_LIMIT, "200Mi"),
        ];
        let request = admission_request(pod_json("team-a", Some(&resources[..]), &["app"]));

        let patch = patch_of(&injector.mutate(&request).await);

        let container = &patch[0]["value"];
        assert_eq!(container["args"][8], "--role-arn");
        assert_eq!(container["args"][9], "arn:aws:iam::123456789012:role/es");
        assert_eq!(
            container["resources"],
            json!({"requests": {"cpu": "200m"}, "limits": {"memory": "200Mi"}})
        );
    }

    #[tokio::test]
    async fn test_malformed_host_is_denied() {
        let injector = injector(StaticLookup(map(&[(labels::INJECT, "true")])));
        let request = admission_request(pod_json(
            "team-a",
            Some(&[(annotations::HOST, "localhost")]),
            &["app"],
        ));

        let response = injector.mutate(&request).await;

        assert!(!response.allowed);
        assert!(response.patch.is_none());
        assert!(response.result.message.contains("localhost"));
    }

    #[tokio::test]
    async fn test_invalid_quantity_is_denied() {
        let injector = injector(StaticLookup(map(&[
            (labels::INJECT, "true"),
            (labels::HOST, "es.us-east-1.amazonaws.com"),
        ])));
        let request = admission_request(pod_json(
            "team-a",
            Some(&[(annotations::CPU_LIMIT, "two cores")]),
            &["app"],
        ));

        let response = injector.mutate(&request).await;

        assert!(!response.allowed);
        assert!(response.result.message.contains(annotations::CPU_LIMIT));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_denied() {
        let request = admission_request(pod_json("team-a", None, &["app"]));

        let response = injector(FailingLookup).mutate(&request).await;

        assert!(!response.allowed);
        assert!(response.result.message.contains("forbidden"));
    }

    #[tokio::test]
    async fn test_lookup_timeout_is_denied() {
        let request = admission_request(pod_json("team-a", None, &["app"]));

        let response = injector(SlowLookup).mutate(&request).await;

        assert!(!response.allowed);
        assert!(response.result.message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_non_pod_object_is_denied() {
        let injector = injector(StaticLookup(BTreeMap::new()));
        let request = admission_request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "broken"},
            "spec": {"containers": "not-a-list"}
        }));

        let response = injector.mutate(&request).await;

        assert!(!response.allowed);
    }
}

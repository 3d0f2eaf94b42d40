// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The signing proxy container added to mutated pods

use crate::constants::sidecar::{
    CONTAINER_NAME, CONTAINER_PORT, IMAGE_PULL_POLICY, LISTEN_ADDRESS,
};
use crate::resolver::ResolvedParameters;
use k8s_openapi::api::core::v1::{Container, ContainerPort};

/// Command line of the aws-sigv4-proxy
pub fn build_sidecar_args(params: &ResolvedParameters) -> Vec<String> {
    let mut args: Vec<String> = [
        "--name",
        params.name.as_str(),
        "--region",
        params.region.as_str(),
        "--host",
        params.host.as_str(),
        "--port",
        LISTEN_ADDRESS,
    ]
    .into_iter()
    .map(String::from)
    .collect();

    if !params.role_arn.is_empty() {
        args.extend(["--role-arn".to_string(), params.role_arn.clone()]);
    }

    args
}

pub fn sidecar_container(params: &ResolvedParameters, image: &str) -> Container {
    Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(IMAGE_PULL_POLICY.to_string()),
        ports: Some(vec![ContainerPort {
            container_port: CONTAINER_PORT,
            ..Default::default()
        }]),
        args: Some(build_sidecar_args(params)),
        resources: params.resources.clone(),
        ..Default::default()
    }
}

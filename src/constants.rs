// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Pod annotation keys read (and written) by the injector
pub mod annotations {
    /// Tri-state opt-in/opt-out flag for injection
    pub const INJECT: &str = "sidecar.aws.signing-proxy/inject";
    /// Upstream AWS endpoint the proxy signs requests for
    pub const HOST: &str = "sidecar.aws.signing-proxy/host";
    /// AWS service signing name (derived from the host if absent)
    pub const NAME: &str = "sidecar.aws.signing-proxy/name";
    /// AWS signing region (derived from the host if absent)
    pub const REGION: &str = "sidecar.aws.signing-proxy/region";
    /// IAM role the proxy should assume
    pub const ROLE_ARN: &str = "sidecar.aws.signing-proxy/role-arn";
    /// Idempotency marker stamped on every mutated pod
    pub const STATUS: &str = "sidecar.aws.signing-proxy/status";

    pub const CPU_REQUEST: &str = "sidecar.aws.signing-proxy/cpu-request";
    pub const MEMORY_REQUEST: &str = "sidecar.aws.signing-proxy/memory-request";
    pub const CPU_LIMIT: &str = "sidecar.aws.signing-proxy/cpu-limit";
    pub const MEMORY_LIMIT: &str = "sidecar.aws.signing-proxy/memory-limit";

    /// Value of [`STATUS`] once the sidecar has been added
    pub const STATUS_INJECTED: &str = "injected";
}

/// Namespace label keys, maintained by cluster administrators
pub mod labels {
    pub const INJECT: &str = "sidecar-inject";
    pub const HOST: &str = "sidecar-host";
    pub const NAME: &str = "sidecar-name";
    pub const REGION: &str = "sidecar-region";
    pub const ROLE_ARN: &str = "sidecar-role-arn";
}

/// Shape of the injected proxy container
pub mod sidecar {
    pub const CONTAINER_NAME: &str = "sidecar-aws-sigv4-proxy";
    pub const CONTAINER_PORT: i32 = 8005;
    pub const LISTEN_ADDRESS: &str = ":8005";
    pub const IMAGE_PULL_POLICY: &str = "IfNotPresent";
    pub const DEFAULT_IMAGE: &str = "public.ecr.aws/aws-observability/aws-sigv4-proxy:latest";
    /// JSON pointer of the pod's container list
    pub const CONTAINERS_PATH: &str = "/spec/containers";
    /// JSON pointer of the pod's annotation map
    pub const ANNOTATIONS_PATH: &str = "/metadata/annotations";
}

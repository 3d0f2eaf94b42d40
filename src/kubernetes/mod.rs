// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes API access used while admitting pods.

pub mod namespaces;

pub use namespaces::{KubeNamespaceLookup, NamespaceLookup};

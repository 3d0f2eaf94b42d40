// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InjectorError {
    #[error("Failed to look up namespace {namespace}: {reason}")]
    NamespaceLookup { namespace: String, reason: String },

    #[error("Namespace lookup for {namespace} timed out after {timeout:?}")]
    LookupTimeout { namespace: String, timeout: Duration },

    #[error("No upstream host set on the pod or its namespace")]
    MissingHost,

    #[error("Cannot derive signing name and region from host '{0}'")]
    MalformedHost(String),

    #[error("Invalid quantity '{value}' in annotation {annotation}")]
    InvalidQuantity { annotation: String, value: String },

    #[error("Invalid admission object: {0}")]
    InvalidObject(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TLS configuration error: {0}")]
    TlsError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InjectorError>;

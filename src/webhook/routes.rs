// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! HTTP routing for the admission endpoint

use super::Injector;
use crate::kubernetes::NamespaceLookup;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::DynamicObject;
use std::fmt::Display;
use tracing::{debug, trace, warn};

pub type Body = Full<Bytes>;

pub const MUTATE_PATH: &str = "/mutate";
pub const HEALTH_PATH: &str = "/healthz";

/// Route a single HTTP request
pub async fn handle<L, B>(injector: &Injector<L>, req: Request<B>) -> Response<Body>
where
    L: NamespaceLookup,
    B: hyper::body::Body,
    B::Error: Display,
{
    match (req.method(), req.uri().path()) {
        (&Method::GET, HEALTH_PATH) => text_response(StatusCode::OK, "ok"),
        (&Method::POST, MUTATE_PATH) => mutate(injector, req).await,
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn mutate<L, B>(injector: &Injector<L>, req: Request<B>) -> Response<Body>
where
    L: NamespaceLookup,
    B: hyper::body::Body,
    B::Error: Display,
{
    let is_json = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|m| m.trim() == "application/json");

    if !is_json {
        warn!("Invalid Content-Type, expected application/json");
        return text_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Invalid Content-Type, expected application/json",
        );
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Error reading body: {}", e);
            return text_response(StatusCode::BAD_REQUEST, "Unreadable request body");
        }
    };

    if body.is_empty() {
        warn!("Empty request body");
        return text_response(StatusCode::BAD_REQUEST, "Empty request body");
    }

    let review: AdmissionReview<DynamicObject> = match serde_json::from_slice(&body) {
        Ok(review) => review,
        Err(e) => {
            warn!("Failed to parse AdmissionReview: {}", e);
            return review_response(AdmissionResponse::invalid(e).into_review());
        }
    };
    trace!(?review);

    let request: std::result::Result<AdmissionRequest<DynamicObject>, _> = review.try_into();
    let response = match request {
        Ok(request) => injector.mutate(&request).await,
        Err(e) => {
            warn!("Invalid admission request: {}", e);
            AdmissionResponse::invalid(e)
        }
    };
    debug!(allowed = response.allowed, "Admission response");

    review_response(response.into_review())
}

fn review_response(review: AdmissionReview<DynamicObject>) -> Response<Body> {
    match serde_json::to_vec(&review) {
        Ok(body) => response(StatusCode::OK, "application/json", Bytes::from(body)),
        Err(e) => {
            warn!("Error encoding response: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn text_response(status: StatusCode, message: &'static str) -> Response<Body> {
    response(
        status,
        "text/plain; charset=utf-8",
        Bytes::from_static(message.as_bytes()),
    )
}

fn response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Body> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

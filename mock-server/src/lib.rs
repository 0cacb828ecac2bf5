//! Upstream HTTP server the simulated host talks to in end-to-end tests.
//!
//! Routes cover what the guest protocol needs to exercise: a fixed JSON
//! body, an echo of the request, bodies of a chosen size, arbitrary status
//! codes, and a header of a chosen width.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// Upper bound for `/bytes/{n}` and `/large-header/{n}`.
pub const MAX_GENERATED_LEN: usize = 1 << 20;

/// What `/post` and `/anything` send back.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub data: String,
    pub body_len: usize,
}

pub fn app() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/post", axum::routing::post(echo))
        .route("/anything", any(echo))
        .route("/bytes/{n}", get(bytes))
        .route("/status/{code}", any(status))
        .route("/large-header/{n}", get(large_header))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn healthz() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], r#""OK""#)
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    tracing::debug!(%method, body_len = body.len(), "echoing request");
    let headers = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        data: String::from_utf8_lossy(&body).into_owned(),
        body_len: body.len(),
    })
}

/// `n` bytes cycling through 0..=250, so chunk boundaries show up in tests.
pub fn pattern(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

async fn bytes(Path(n): Path<usize>) -> Result<impl IntoResponse, StatusCode> {
    if n > MAX_GENERATED_LEN {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], pattern(n)))
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn large_header(Path(n): Path<usize>) -> Result<impl IntoResponse, StatusCode> {
    if n > MAX_GENERATED_LEN {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    Ok(([("x-large", "a".repeat(n))], "ok"))
}

//! Guest-side HTTP client for WebAssembly modules without socket access.
//!
//! # Overview
//! The guest describes a request as plain data; the host runtime performs
//! the exchange outside the sandbox. Everything crosses the boundary as
//! (pointer, length) pairs into linear memory, out-cells the host writes,
//! and a `u32` return code.
//!
//! # Design
//! - `abi::Host` mirrors the host's imported functions one-to-one. The wasm
//!   binding lives in `wasi-http-ffi`; tests implement it natively.
//! - `Client::send` is the marshaling layer: one host call per request,
//!   per-call scratch cells read only after a zero return code.
//! - `Response` is the streaming accessor. It owns the move-only
//!   `ResponseHandle` and releases it exactly once.
//! - `headers` is the `key:value\n` codec, strict in both directions.

pub mod abi;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod response;
mod scratch;

pub use abi::{Host, RawHandle};
pub use client::{Client, EncodedRequest};
pub use config::ClientConfig;
pub use error::{HostErrorCode, HttpError};
pub use crate::http::{Method, Request};
pub use response::{Response, ResponseHandle};

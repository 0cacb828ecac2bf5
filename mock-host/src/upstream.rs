//! Where the simulated host sends the exchange once the guest's request has
//! been decoded and checked.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use tracing::{debug, warn};
use wasi_http_guest::{HostErrorCode, HttpError};

/// A decoded guest request.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub url: String,
    pub method: http::Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The upstream's answer, kept by the host until the guest closes the handle.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Add a header value. Repeating a name keeps every value.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(HttpError::invalid_header)?;
        let value = HeaderValue::from_str(value).map_err(HttpError::invalid_header)?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Performs the actual HTTP exchange for the host.
pub trait Upstream: Send + Sync {
    fn exchange(&self, exchange: &Exchange) -> Result<Reply, HostErrorCode>;
}

impl<F> Upstream for F
where
    F: Fn(&Exchange) -> Result<Reply, HostErrorCode> + Send + Sync,
{
    fn exchange(&self, exchange: &Exchange) -> Result<Reply, HostErrorCode> {
        self(exchange)
    }
}

/// Real HTTP over `ureq`. Non-2xx statuses are data, not errors.
#[derive(Debug, Clone)]
pub struct UreqUpstream {
    agent: ureq::Agent,
}

impl UreqUpstream {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Upstream for UreqUpstream {
    fn exchange(&self, exchange: &Exchange) -> Result<Reply, HostErrorCode> {
        debug!(
            url = %exchange.url,
            method = %exchange.method,
            body_len = exchange.body.len(),
            "performing request"
        );
        let builder = http::Request::builder()
            .method(exchange.method.clone())
            .uri(&exchange.url);

        let result = if exchange.body.is_empty() {
            let mut req = builder.body(()).map_err(|_| HostErrorCode::InvalidUrl)?;
            *req.headers_mut() = exchange.headers.clone();
            self.agent.run(req)
        } else {
            let mut req = builder
                .body(exchange.body.to_vec())
                .map_err(|_| HostErrorCode::InvalidUrl)?;
            *req.headers_mut() = exchange.headers.clone();
            self.agent.run(req)
        };

        let mut res = result.map_err(|e| {
            warn!(error = %e, url = %exchange.url, "upstream request failed");
            HostErrorCode::RequestError
        })?;
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.body_mut().read_to_vec().map_err(|e| {
            warn!(error = %e, "failed to read upstream body");
            HostErrorCode::RequestError
        })?;
        Ok(Reply {
            status,
            headers,
            body: Bytes::from(body),
        })
    }
}

//! Request types handed to the host.
//!
//! # Design
//! `Request` is plain data: the marshaling layer only borrows it, so a value
//! can be sent more than once. Headers use `http::HeaderMap`, whose name and
//! value types already refuse most of what would corrupt the `key:value\n`
//! wire text. The header codec still re-checks at the boundary.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::error::HttpError;

/// HTTP method of a request. Only the nine standard methods cross the
/// boundary; extension methods are rejected before the host is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "CONNECT" => Method::Connect,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            "PATCH" => Method::Patch,
            other => return Err(HttpError::InvalidMethod(other.to_string())),
        };
        Ok(method)
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = HttpError;

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

impl From<Method> for http::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Connect => http::Method::CONNECT,
            Method::Options => http::Method::OPTIONS,
            Method::Trace => http::Method::TRACE,
            Method::Patch => http::Method::PATCH,
        }
    }
}

/// An outbound HTTP request described as plain data.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    /// A `GET` request with no headers and an empty body.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set a header, replacing any previous value under the same name.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(HttpError::invalid_header)?;
        let value = HeaderValue::from_str(value).map_err(HttpError::invalid_header)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl TryFrom<http::Request<Bytes>> for Request {
    type Error = HttpError;

    fn try_from(req: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = req.into_parts();
        Ok(Self {
            url: parts.uri.to_string(),
            method: Method::try_from(&parts.method)?,
            headers: parts.headers,
            body,
        })
    }
}

impl TryFrom<http::Request<Option<Bytes>>> for Request {
    type Error = HttpError;

    fn try_from(req: http::Request<Option<Bytes>>) -> Result<Self, Self::Error> {
        Request::try_from(req.map(Option::unwrap_or_default))
    }
}

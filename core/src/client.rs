//! Request marshaling: turning a `Request` into one host `req` call.
//!
//! # Design
//! `Client` holds a host and a `ClientConfig` and carries no state between
//! calls. `send` borrows the request's buffers for the duration of the call,
//! allocates one scratch block for the status and handle cells, and reads
//! that block only after the host returned `0`. The call blocks until the
//! host has finished the exchange; it cannot be cancelled once made.

use http::StatusCode;
use tracing::{debug, error};

use crate::abi::Host;
use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::headers;
use crate::http::Request;
use crate::response::{close_handle, Response, ResponseHandle};
use crate::scratch::{RequestCells, Scratch};

/// The byte buffers handed to `req`, borrowed from a `Request`.
#[derive(Debug)]
pub struct EncodedRequest<'a> {
    pub url: &'a [u8],
    pub method: &'static [u8],
    pub headers: String,
    pub body: &'a [u8],
}

impl<'a> EncodedRequest<'a> {
    pub fn new(req: &'a Request) -> Result<Self, HttpError> {
        Ok(Self {
            url: req.url.as_bytes(),
            method: req.method.as_str().as_bytes(),
            headers: headers::encode(&req.headers)?,
            body: &req.body,
        })
    }
}

/// Stateless client that sends requests through a host.
#[derive(Debug, Clone)]
pub struct Client<H> {
    host: H,
    config: ClientConfig,
}

impl<H: Host> Client<H> {
    pub const fn new(host: H) -> Self {
        Self {
            host,
            config: ClientConfig::DEFAULT,
        }
    }

    pub fn with_config(host: H, config: ClientConfig) -> Result<Self, HttpError> {
        config.validate()?;
        Ok(Self { host, config })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `req` and return the host's response handle.
    #[tracing::instrument(skip_all, fields(url = %req.url, method = %req.method))]
    pub fn send(&self, req: &Request) -> Result<Response<'_, H>, HttpError> {
        let encoded = EncodedRequest::new(req)?;
        let mut scratch = Scratch::<RequestCells>::new();
        let (status_code_ptr, res_handle_ptr) = scratch.out_ptrs();
        let code = unsafe {
            self.host.req(
                encoded.url.as_ptr(),
                encoded.url.len(),
                encoded.method.as_ptr(),
                encoded.method.len(),
                encoded.headers.as_ptr(),
                encoded.headers.len(),
                encoded.body.as_ptr(),
                encoded.body.len(),
                status_code_ptr,
                res_handle_ptr,
            )
        };
        let cells = scratch.finish(code).inspect_err(|e| {
            error!(code, error = %e, "host rejected request");
        })?;

        let handle = ResponseHandle::new(cells.handle);
        let status = match StatusCode::from_u16(cells.status_code) {
            Ok(status) => status,
            Err(_) => {
                if let Err(e) = close_handle(&self.host, handle) {
                    error!(error = %e, "failed to close handle after invalid status");
                }
                return Err(HttpError::InvalidStatus(cells.status_code));
            }
        };
        debug!(status = status.as_u16(), handle = cells.handle, "got response");
        Response::from_handle(&self.host, handle, status, self.config.clone())
    }

    /// Convert an `http::Request` and send it.
    pub fn send_http<B>(&self, req: http::Request<B>) -> Result<Response<'_, H>, HttpError>
    where
        Request: TryFrom<http::Request<B>, Error = HttpError>,
    {
        let req = Request::try_from(req)?;
        self.send(&req)
    }
}

//! Streaming access to a response the host has accepted.
//!
//! # Design
//! The host keeps status, headers and body; the guest holds a
//! [`ResponseHandle`] and asks for pieces through further host calls. The
//! handle is move-only and lives inside [`Response`], so it is released
//! exactly once: by [`Response::close`], which consumes the response, or by
//! `Drop` if the caller never closed it.
//!
//! Buffers passed to the host are bounded by [`ClientConfig`]. When the host
//! reports that a buffer was too small the accessor returns
//! [`HttpError::Truncated`] instead of an empty value.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use tracing::{trace, warn};

use crate::abi::{Host, RawHandle};
use crate::config::ClientConfig;
use crate::error::{HostErrorCode, HttpError};
use crate::headers;
use crate::scratch::{Scratch, WrittenCell};

/// Host-issued token for one response. Not `Copy`, not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct ResponseHandle(RawHandle);

impl ResponseHandle {
    pub(crate) fn new(raw: RawHandle) -> Self {
        Self(raw)
    }

    /// Adopt a raw handle obtained elsewhere.
    ///
    /// # Safety
    /// The caller must own `raw`: no other `ResponseHandle` for it may exist,
    /// since whichever one is released last will close an already-closed
    /// handle.
    pub unsafe fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> RawHandle {
        self.0
    }
}

/// An HTTP response whose headers and body are still held by the host.
pub struct Response<'h, H: Host> {
    host: &'h H,
    handle: Option<ResponseHandle>,
    status: StatusCode,
    config: ClientConfig,
}

impl<'h, H: Host> Response<'h, H> {
    /// Wrap a handle the caller owns. The response closes it on drop.
    ///
    /// An invalid `config` is rejected, and the handle is closed before the
    /// error is returned.
    pub fn from_handle(
        host: &'h H,
        handle: ResponseHandle,
        status: StatusCode,
        config: ClientConfig,
    ) -> Result<Self, HttpError> {
        if let Err(e) = config.validate() {
            let raw = handle.raw();
            if let Err(close_err) = close_handle(host, handle) {
                warn!(handle = raw, error = %close_err, "failed to close rejected handle");
            }
            return Err(e);
        }
        Ok(Self {
            host,
            handle: Some(handle),
            status,
            config,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw host handle, for logging and diagnostics.
    pub fn raw_handle(&self) -> RawHandle {
        // Only `close` and `drop` take the handle, and both consume `self`.
        self.handle.as_ref().map_or(0, ResponseHandle::raw)
    }

    /// Read the next part of the body into `buf`. `Ok(0)` means the body is
    /// exhausted (or `buf` is empty).
    pub fn body_read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let mut scratch = Scratch::<WrittenCell>::new();
        let code = unsafe {
            self.host.body_read(
                self.raw_handle(),
                buf.as_mut_ptr(),
                buf.len(),
                scratch.written_ptr(),
            )
        };
        let written = scratch.finish(code)?.written;
        if written > buf.len() {
            return Err(HttpError::Host(HostErrorCode::MemoryAccessError));
        }
        trace!(handle = self.raw_handle(), written, "read body chunk");
        Ok(written)
    }

    /// Drain the rest of the body. A second call returns an empty body since
    /// the host-side cursor is already at the end.
    pub fn body_read_all(&mut self) -> Result<Bytes, HttpError> {
        let mut chunk = vec![0u8; self.config.body_chunk_size];
        let mut body = BytesMut::new();
        loop {
            let n = self.body_read(&mut chunk)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok(body.freeze())
    }

    /// Look up one header. `Ok(None)` if the host has no header by that name.
    pub fn header_get(&self, name: &str) -> Result<Option<String>, HttpError> {
        self.header_get_with_capacity(name, self.config.header_value_capacity)
    }

    /// Same as [`header_get`](Self::header_get) with an explicit value buffer
    /// size, for retrying after [`HttpError::Truncated`].
    pub fn header_get_with_capacity(
        &self,
        name: &str,
        capacity: usize,
    ) -> Result<Option<String>, HttpError> {
        let mut buf = vec![0u8; capacity];
        let mut scratch = Scratch::<WrittenCell>::new();
        let code = unsafe {
            self.host.header_get(
                self.raw_handle(),
                name.as_ptr(),
                name.len(),
                buf.as_mut_ptr(),
                buf.len(),
                scratch.written_ptr(),
            )
        };
        let written = match scratch.finish(code) {
            Ok(cell) => cell.written,
            Err(HttpError::Host(HostErrorCode::HeaderNotFound)) => return Ok(None),
            Err(HttpError::Host(HostErrorCode::BufferTooSmall)) => {
                return Err(HttpError::Truncated { capacity });
            }
            Err(e) => return Err(e),
        };
        let value = read_text(&buf, written)?;
        Ok(Some(value.to_string()))
    }

    /// Fetch and decode every response header.
    pub fn headers_get_all(&self) -> Result<HeaderMap, HttpError> {
        self.headers_get_all_with_capacity(self.config.headers_capacity)
    }

    pub fn headers_get_all_with_capacity(&self, capacity: usize) -> Result<HeaderMap, HttpError> {
        let mut buf = vec![0u8; capacity];
        let mut scratch = Scratch::<WrittenCell>::new();
        let code = unsafe {
            self.host.headers_get_all(
                self.raw_handle(),
                buf.as_mut_ptr(),
                buf.len(),
                scratch.written_ptr(),
            )
        };
        let written = match scratch.finish(code) {
            Ok(cell) => cell.written,
            Err(HttpError::Host(HostErrorCode::BufferTooSmall)) => {
                return Err(HttpError::Truncated { capacity });
            }
            Err(e) => return Err(e),
        };
        headers::decode(read_text(&buf, written)?)
    }

    /// Release the host-side resource.
    pub fn close(mut self) -> Result<(), HttpError> {
        match self.handle.take() {
            Some(handle) => close_handle(self.host, handle),
            None => Ok(()),
        }
    }
}

/// Release `handle` on `host`.
pub(crate) fn close_handle<H: Host>(host: &H, handle: ResponseHandle) -> Result<(), HttpError> {
    let code = unsafe { host.close(handle.raw()) };
    crate::error::check(code)
}

fn read_text(buf: &[u8], written: usize) -> Result<&str, HttpError> {
    let bytes = buf
        .get(..written)
        .ok_or(HttpError::Host(HostErrorCode::MemoryAccessError))?;
    Ok(std::str::from_utf8(bytes)?)
}

impl<H: Host> Drop for Response<'_, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let raw = handle.raw();
            if let Err(e) = close_handle(self.host, handle) {
                warn!(handle = raw, error = %e, "failed to close response handle");
            }
        }
    }
}

impl<H: Host> io::Read for Response<'_, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body_read(buf).map_err(io::Error::other)
    }
}

impl<H: Host> fmt::Debug for Response<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("handle", &self.handle)
            .field("status", &self.status)
            .finish()
    }
}

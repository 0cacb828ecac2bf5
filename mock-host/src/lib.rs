//! A native stand-in for the runtime side of `wasi_experimental_http`.
//!
//! # Overview
//! `SimHost` implements the guest's [`Host`] trait over ordinary process
//! memory, so the guest client can be driven end to end without a wasm
//! runtime. It does what the runtime does: decodes the guest's request,
//! checks it against a [`HostConfig`], performs the exchange through an
//! [`Upstream`] and keeps the reply in a session until the guest closes the
//! handle.
//!
//! # Design
//! - Sessions live behind one `Mutex`; handles are never reused.
//! - An exchange holds a session slot from the limit check until its
//!   session is stored or it fails.
//! - Repeated upstream header values are merged into one value per name.
//! - Every request that decodes is recorded, so tests can see exactly what
//!   crossed the boundary.
//! - Failures are returned as host error codes, never as panics.

mod config;
mod memory;
mod upstream;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use http::header::HeaderName;
use http::HeaderMap;
use tracing::{debug, warn};
use url::Url;
use wasi_http_guest::{headers, Host, HostErrorCode, HttpError, Method, RawHandle};

pub use config::HostConfig;
pub use upstream::{Exchange, Reply, UreqUpstream, Upstream};

use config::Policy;

/// What the host saw for one decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub url: String,
    pub method: String,
    pub headers_text: String,
    pub body_len: usize,
}

#[derive(Debug)]
struct Session {
    headers: HeaderMap,
    body: Bytes,
    cursor: usize,
}

#[derive(Debug)]
struct State {
    next_handle: RawHandle,
    sessions: HashMap<RawHandle, Session>,
    /// Exchanges that passed the session limit but have no session yet.
    in_flight: usize,
    received: Vec<Received>,
}

pub struct SimHost {
    policy: Policy,
    upstream: Box<dyn Upstream>,
    state: Mutex<State>,
}

impl SimHost {
    pub fn new(config: HostConfig, upstream: impl Upstream + 'static) -> Result<Self, HttpError> {
        Ok(Self {
            policy: Policy::new(&config)?,
            upstream: Box::new(upstream),
            state: Mutex::new(State {
                next_handle: 1,
                sessions: HashMap::new(),
                in_flight: 0,
                received: Vec::new(),
            }),
        })
    }

    /// A host that performs real HTTP requests.
    pub fn http(config: HostConfig) -> Result<Self, HttpError> {
        Self::new(config, UreqUpstream::new())
    }

    /// Requests seen so far, in order.
    pub fn received(&self) -> Vec<Received> {
        self.state().map(|s| s.received.clone()).unwrap_or_default()
    }

    pub fn open_sessions(&self) -> usize {
        self.state().map(|s| s.sessions.len()).unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, HostErrorCode> {
        self.state.lock().map_err(|_| HostErrorCode::RuntimeError)
    }

    #[allow(clippy::too_many_arguments)]
    unsafe fn try_req(
        &self,
        url_ptr: *const u8,
        url_len: usize,
        method_ptr: *const u8,
        method_len: usize,
        headers_ptr: *const u8,
        headers_len: usize,
        body_ptr: *const u8,
        body_len: usize,
        status_code_ptr: *mut u16,
        res_handle_ptr: *mut RawHandle,
    ) -> Result<(), HostErrorCode> {
        let url = unsafe { memory::read_str(url_ptr, url_len)? };
        let method = unsafe { memory::read_str(method_ptr, method_len)? };
        let headers_text = unsafe { memory::read_str(headers_ptr, headers_len)? };
        let body = unsafe { memory::read(body_ptr, body_len)? };

        let method: Method = method.parse().map_err(|_| HostErrorCode::InvalidMethod)?;
        let headers = headers::decode(headers_text).map_err(|e| {
            debug!(error = %e, "rejecting header text");
            HostErrorCode::InvalidEncoding
        })?;

        self.state()?.received.push(Received {
            url: url.to_string(),
            method: method.to_string(),
            headers_text: headers_text.to_string(),
            body_len: body.len(),
        });

        let parsed = Url::parse(url).map_err(|_| HostErrorCode::InvalidUrl)?;
        if !self.policy.is_allowed(&parsed) {
            warn!(url, "destination not allowed");
            return Err(HostErrorCode::DestinationNotAllowed);
        }
        self.reserve_slot()?;

        let exchange = Exchange {
            url: url.to_string(),
            method: method.into(),
            headers,
            body: Bytes::copy_from_slice(body),
        };
        let reply = self.upstream.exchange(&exchange);

        let mut state = self.state()?;
        state.in_flight -= 1;
        let reply = reply?;
        let handle = state.next_handle;
        unsafe {
            memory::write_cell(status_code_ptr, reply.status)?;
            memory::write_cell(res_handle_ptr, handle)?;
        }
        state.next_handle += 1;
        state.sessions.insert(
            handle,
            Session {
                headers: headers::merge_repeated(&reply.headers),
                body: reply.body,
                cursor: 0,
            },
        );
        debug!(handle, status = reply.status, "opened session");
        Ok(())
    }

    /// Count one exchange against `max_concurrent_requests`. The caller
    /// gives the slot back under the same lock that stores the session.
    fn reserve_slot(&self) -> Result<(), HostErrorCode> {
        let mut state = self.state()?;
        if let Some(max) = self.policy.max_concurrent_requests {
            if state.sessions.len() + state.in_flight >= max as usize {
                return Err(HostErrorCode::TooManySessions);
            }
        }
        state.in_flight += 1;
        Ok(())
    }

    fn with_session<T>(
        &self,
        handle: RawHandle,
        f: impl FnOnce(&mut Session) -> Result<T, HostErrorCode>,
    ) -> Result<T, HostErrorCode> {
        let mut state = self.state()?;
        let session = state.sessions.get_mut(&handle).ok_or(HostErrorCode::InvalidHandle)?;
        f(session)
    }
}

fn status(result: Result<(), HostErrorCode>) -> u32 {
    match result {
        Ok(()) => 0,
        Err(code) => code.as_raw(),
    }
}

unsafe impl Host for SimHost {
    unsafe fn req(
        &self,
        url_ptr: *const u8,
        url_len: usize,
        method_ptr: *const u8,
        method_len: usize,
        headers_ptr: *const u8,
        headers_len: usize,
        body_ptr: *const u8,
        body_len: usize,
        status_code_ptr: *mut u16,
        res_handle_ptr: *mut RawHandle,
    ) -> u32 {
        status(unsafe {
            self.try_req(
                url_ptr,
                url_len,
                method_ptr,
                method_len,
                headers_ptr,
                headers_len,
                body_ptr,
                body_len,
                status_code_ptr,
                res_handle_ptr,
            )
        })
    }

    unsafe fn close(&self, handle: RawHandle) -> u32 {
        status(self.state().and_then(|mut state| {
            state.sessions.remove(&handle).ok_or(HostErrorCode::InvalidHandle)?;
            debug!(handle, "closed session");
            Ok(())
        }))
    }

    unsafe fn header_get(
        &self,
        handle: RawHandle,
        name_ptr: *const u8,
        name_len: usize,
        value_ptr: *mut u8,
        value_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        status(self.with_session(handle, |session| {
            let name = unsafe { memory::read_str(name_ptr, name_len)? };
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HostErrorCode::HeaderNotFound)?;
            let value = session.headers.get(&name).ok_or(HostErrorCode::HeaderNotFound)?;
            let value = value.to_str().map_err(|_| HostErrorCode::Utf8Error)?;
            unsafe { memory::write_all(value.as_bytes(), value_ptr, value_len, written_ptr) }
        }))
    }

    unsafe fn headers_get_all(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        status(self.with_session(handle, |session| {
            let text =
                headers::encode(&session.headers).map_err(|_| HostErrorCode::InvalidEncoding)?;
            unsafe { memory::write_all(text.as_bytes(), buf_ptr, buf_len, written_ptr) }
        }))
    }

    unsafe fn body_read(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        status(self.with_session(handle, |session| {
            let rest = &session.body[session.cursor..];
            let n = unsafe { memory::write_prefix(rest, buf_ptr, buf_len, written_ptr)? };
            session.cursor += n;
            Ok(())
        }))
    }
}

//! WebAssembly binding for `wasi-http-guest`.
//!
//! # Overview
//! Binds the `Host` trait to the functions the runtime imports under
//! `wasi_experimental_http`, and exports the `alloc` function the runtime
//! calls when it needs guest memory to write into.
//!
//! # Design
//! - `WasmHost` is a zero-sized forwarder; all protocol logic stays in the
//!   core crate.
//! - `request` sends through a process-wide client, so responses borrow a
//!   `'static` host and can be returned freely.
//! - `alloc` wraps its body in `catch_unwind` so a panic never unwinds into
//!   the runtime.

mod imports;

use std::panic::catch_unwind;

use wasi_http_guest::{Client, Host, HttpError, RawHandle, Request, Response};

pub use wasi_http_guest as guest;

/// The host the module was instantiated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmHost;

unsafe impl Host for WasmHost {
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
        unsafe {
            imports::req(
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
        }
    }

    unsafe fn close(&self, handle: RawHandle) -> u32 {
        unsafe { imports::close(handle) }
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
        unsafe {
            imports::header_get(handle, name_ptr, name_len, value_ptr, value_len, written_ptr)
        }
    }

    unsafe fn headers_get_all(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        unsafe { imports::headers_get_all(handle, buf_ptr, buf_len, written_ptr) }
    }

    unsafe fn body_read(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        unsafe { imports::body_read(handle, buf_ptr, buf_len, written_ptr) }
    }
}

static CLIENT: Client<WasmHost> = Client::new(WasmHost);

/// Send `req` through the runtime and return a streaming response.
pub fn request(req: &Request) -> Result<Response<'static, WasmHost>, HttpError> {
    CLIENT.send(req)
}

/// Convert an `http::Request` and send it through the runtime.
pub fn request_http(
    req: http::Request<Option<bytes::Bytes>>,
) -> Result<Response<'static, WasmHost>, HttpError> {
    CLIENT.send_http(req)
}

/// Reserve `len` bytes of linear memory for the runtime and return the
/// offset of the block. The block is handed over to whoever the runtime
/// passes the address to; this module never frees it itself.
///
/// Returns null if allocation panics.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn alloc(len: usize) -> *mut u8 {
    catch_unwind(|| {
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        let ptr = buf.as_mut_ptr();
        std::mem::forget(buf);
        ptr
    })
    .unwrap_or_else(|_| {
        tracing::error!(len, "allocation for host panicked");
        std::ptr::null_mut()
    })
}

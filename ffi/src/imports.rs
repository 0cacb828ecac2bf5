//! Raw declarations of the `wasi_experimental_http` imports.
//!
//! On `wasm32` these resolve against the host at instantiation time; a module
//! linked against a runtime that lacks them fails to instantiate. Elsewhere
//! there is no host, and every call reports `RuntimeError`.

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "wasi_experimental_http")]
unsafe extern "C" {
    pub fn req(
        url_ptr: *const u8,
        url_len: usize,
        method_ptr: *const u8,
        method_len: usize,
        headers_ptr: *const u8,
        headers_len: usize,
        body_ptr: *const u8,
        body_len: usize,
        status_code_ptr: *mut u16,
        res_handle_ptr: *mut u32,
    ) -> u32;

    pub fn close(handle: u32) -> u32;

    pub fn header_get(
        handle: u32,
        name_ptr: *const u8,
        name_len: usize,
        value_ptr: *mut u8,
        value_len: usize,
        written_ptr: *mut usize,
    ) -> u32;

    pub fn headers_get_all(
        handle: u32,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32;

    pub fn body_read(handle: u32, buf_ptr: *mut u8, buf_len: usize, written_ptr: *mut usize) -> u32;
}

#[cfg(not(target_arch = "wasm32"))]
mod unlinked {
    use wasi_http_guest::HostErrorCode;

    const NO_HOST: u32 = HostErrorCode::RuntimeError as u32;

    #[allow(clippy::too_many_arguments)]
    pub unsafe fn req(
        _url_ptr: *const u8,
        _url_len: usize,
        _method_ptr: *const u8,
        _method_len: usize,
        _headers_ptr: *const u8,
        _headers_len: usize,
        _body_ptr: *const u8,
        _body_len: usize,
        _status_code_ptr: *mut u16,
        _res_handle_ptr: *mut u32,
    ) -> u32 {
        NO_HOST
    }

    pub unsafe fn close(_handle: u32) -> u32 {
        NO_HOST
    }

    pub unsafe fn header_get(
        _handle: u32,
        _name_ptr: *const u8,
        _name_len: usize,
        _value_ptr: *mut u8,
        _value_len: usize,
        _written_ptr: *mut usize,
    ) -> u32 {
        NO_HOST
    }

    pub unsafe fn headers_get_all(
        _handle: u32,
        _buf_ptr: *mut u8,
        _buf_len: usize,
        _written_ptr: *mut usize,
    ) -> u32 {
        NO_HOST
    }

    pub unsafe fn body_read(
        _handle: u32,
        _buf_ptr: *mut u8,
        _buf_len: usize,
        _written_ptr: *mut usize,
    ) -> u32 {
        NO_HOST
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use unlinked::*;

//! The host import surface, as a trait.
//!
//! Each method has the exact argument list of the corresponding import in the
//! `wasi_experimental_http` module: pointers are addresses in the guest's
//! linear memory, lengths are byte counts, and the return value is `0` on
//! success or a code from [`HostErrorCode`](crate::HostErrorCode).
//!
//! Out-pointers (`status_code_ptr`, `res_handle_ptr`, `*_written_ptr`) point
//! at cells the guest allocated for this one call. The host writes them only
//! when it returns `0`.

/// Host-issued response identifier.
pub type RawHandle = u32;

/// Name of the import module the host must provide.
pub const IMPORT_MODULE: &str = "wasi_experimental_http";

/// The functions a host exposes to the guest.
///
/// # Safety
/// Implementations read `*_len` bytes at every input pointer and write at most
/// `*_len` bytes at every output buffer, plus one value per out-cell. Callers
/// must pass pointers that are valid for those accesses for the duration of
/// the call.
pub unsafe trait Host {
    #[allow(clippy::too_many_arguments)]
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
    ) -> u32;

    unsafe fn close(&self, handle: RawHandle) -> u32;

    unsafe fn header_get(
        &self,
        handle: RawHandle,
        name_ptr: *const u8,
        name_len: usize,
        value_ptr: *mut u8,
        value_len: usize,
        written_ptr: *mut usize,
    ) -> u32;

    unsafe fn headers_get_all(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32;

    unsafe fn body_read(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32;
}

unsafe impl<H: Host + ?Sized> Host for &H {
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
            (**self).req(
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
        unsafe { (**self).close(handle) }
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
            (**self).header_get(handle, name_ptr, name_len, value_ptr, value_len, written_ptr)
        }
    }

    unsafe fn headers_get_all(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        unsafe { (**self).headers_get_all(handle, buf_ptr, buf_len, written_ptr) }
    }

    unsafe fn body_read(
        &self,
        handle: RawHandle,
        buf_ptr: *mut u8,
        buf_len: usize,
        written_ptr: *mut usize,
    ) -> u32 {
        unsafe { (**self).body_read(handle, buf_ptr, buf_len, written_ptr) }
    }
}

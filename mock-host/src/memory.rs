//! Access to the guest's linear memory.
//!
//! Natively the guest and host share one address space, so guest pointers
//! are ordinary pointers. The checks here are the ones a runtime makes
//! against a real memory export: null with a nonzero length is a fault, and
//! nothing is written past the length the guest declared.

use wasi_http_guest::HostErrorCode;

/// Borrow `len` bytes of guest memory at `ptr`.
///
/// # Safety
/// `ptr..ptr + len` must be readable for `'a`.
pub(crate) unsafe fn read<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], HostErrorCode> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(HostErrorCode::MemoryAccessError);
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Borrow `len` bytes of guest memory at `ptr` as UTF-8.
///
/// # Safety
/// Same as [`read`].
pub(crate) unsafe fn read_str<'a>(ptr: *const u8, len: usize) -> Result<&'a str, HostErrorCode> {
    let bytes = unsafe { read(ptr, len)? };
    std::str::from_utf8(bytes).map_err(|_| HostErrorCode::Utf8Error)
}

/// Copy all of `data` into the guest buffer and record its length, or fail
/// with `BufferTooSmall` without touching either.
///
/// # Safety
/// `buf_ptr..buf_ptr + buf_len` must be writable and `written_ptr` must be
/// valid for a `usize` write.
pub(crate) unsafe fn write_all(
    data: &[u8],
    buf_ptr: *mut u8,
    buf_len: usize,
    written_ptr: *mut usize,
) -> Result<(), HostErrorCode> {
    if data.len() > buf_len {
        return Err(HostErrorCode::BufferTooSmall);
    }
    unsafe { write_prefix(data, buf_ptr, buf_len, written_ptr) }.map(|_| ())
}

/// Copy as much of `data` as fits and record how much that was.
///
/// # Safety
/// Same as [`write_all`].
pub(crate) unsafe fn write_prefix(
    data: &[u8],
    buf_ptr: *mut u8,
    buf_len: usize,
    written_ptr: *mut usize,
) -> Result<usize, HostErrorCode> {
    if written_ptr.is_null() {
        return Err(HostErrorCode::MemoryAccessError);
    }
    let n = data.len().min(buf_len);
    if n > 0 {
        if buf_ptr.is_null() {
            return Err(HostErrorCode::MemoryAccessError);
        }
        unsafe { buf_ptr.copy_from_nonoverlapping(data.as_ptr(), n) };
    }
    unsafe { *written_ptr = n };
    Ok(n)
}

/// Write one value into a guest out-cell.
///
/// # Safety
/// `ptr` must be null or valid for a `T` write.
pub(crate) unsafe fn write_cell<T>(ptr: *mut T, value: T) -> Result<(), HostErrorCode> {
    if ptr.is_null() {
        return Err(HostErrorCode::MemoryAccessError);
    }
    unsafe { ptr.write(value) };
    Ok(())
}

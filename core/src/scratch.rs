//! Per-call scratch memory for host out-parameters.
//!
//! A `Scratch<T>` boxes every out-cell one host call needs in a single
//! allocation, so the addresses stay put while the host writes and the block
//! is freed when the call's frame ends. The cells can only be read through
//! [`Scratch::finish`], which takes the host's return code and refuses to
//! hand them out unless it is `0`.

use std::ptr;

use crate::abi::RawHandle;
use crate::error::{check, HttpError};

/// Out-cells for `req`.
#[repr(C)]
#[derive(Debug, Default)]
pub(crate) struct RequestCells {
    pub status_code: u16,
    pub handle: RawHandle,
}

/// Out-cell for the accessor calls that report a byte count.
#[repr(C)]
#[derive(Debug, Default)]
pub(crate) struct WrittenCell {
    pub written: usize,
}

pub(crate) struct Scratch<T> {
    cells: Box<T>,
}

impl<T: Default> Scratch<T> {
    pub fn new() -> Self {
        Self {
            cells: Box::default(),
        }
    }
}

impl<T> Scratch<T> {
    /// Consume the scratch block once the host has returned `code`.
    pub fn finish(self, code: u32) -> Result<T, HttpError> {
        check(code)?;
        Ok(*self.cells)
    }
}

impl Scratch<RequestCells> {
    /// Status code and handle cells, derived from one borrow of the block.
    pub fn out_ptrs(&mut self) -> (*mut u16, *mut RawHandle) {
        let cells: *mut RequestCells = &mut *self.cells;
        unsafe { (ptr::addr_of_mut!((*cells).status_code), ptr::addr_of_mut!((*cells).handle)) }
    }
}

impl Scratch<WrittenCell> {
    pub fn written_ptr(&mut self) -> *mut usize {
        &mut self.cells.written
    }
}

//! Error types for the guest HTTP client.
//!
//! # Design
//! Every host call returns a `u32`. Zero is success; the known nonzero
//! values map onto `HostErrorCode`. Anything outside that range is kept
//! verbatim in `HttpError::UnknownHostCode` so a newer host never turns into
//! a silent success.
//!
//! `Truncated` gets its own variant because a destination buffer that was
//! too small is recoverable: the caller can retry with a larger capacity.

use std::fmt;
use std::str::Utf8Error;

use thiserror::Error;

/// Error codes a host call can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HostErrorCode {
    InvalidHandle = 1,
    MemoryNotFound = 2,
    MemoryAccessError = 3,
    BufferTooSmall = 4,
    HeaderNotFound = 5,
    Utf8Error = 6,
    DestinationNotAllowed = 7,
    InvalidMethod = 8,
    InvalidEncoding = 9,
    InvalidUrl = 10,
    RequestError = 11,
    RuntimeError = 12,
    TooManySessions = 13,
}

impl HostErrorCode {
    /// Map a raw nonzero return value onto the taxonomy.
    pub fn from_raw(code: u32) -> Option<Self> {
        let code = match code {
            1 => Self::InvalidHandle,
            2 => Self::MemoryNotFound,
            3 => Self::MemoryAccessError,
            4 => Self::BufferTooSmall,
            5 => Self::HeaderNotFound,
            6 => Self::Utf8Error,
            7 => Self::DestinationNotAllowed,
            8 => Self::InvalidMethod,
            9 => Self::InvalidEncoding,
            10 => Self::InvalidUrl,
            11 => Self::RequestError,
            12 => Self::RuntimeError,
            13 => Self::TooManySessions,
            _ => return None,
        };
        Some(code)
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for HostErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidHandle => "invalid handle",
            Self::MemoryNotFound => "memory not found",
            Self::MemoryAccessError => "memory access error",
            Self::BufferTooSmall => "buffer too small",
            Self::HeaderNotFound => "header not found",
            Self::Utf8Error => "invalid utf-8",
            Self::DestinationNotAllowed => "destination not allowed",
            Self::InvalidMethod => "invalid method",
            Self::InvalidEncoding => "invalid encoding",
            Self::InvalidUrl => "invalid url",
            Self::RequestError => "request error",
            Self::RuntimeError => "runtime error",
            Self::TooManySessions => "too many sessions",
        };
        write!(f, "{msg} ({})", self.as_raw())
    }
}

/// Errors returned by the client, the response accessor and the header codec.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The host returned a known nonzero code.
    #[error("host error: {0}")]
    Host(HostErrorCode),

    /// The host returned a nonzero code this library does not know.
    #[error("unknown host error code {0}")]
    UnknownHostCode(u32),

    /// The destination buffer could not hold the value the host had to write.
    #[error("host output does not fit in {capacity} bytes")]
    Truncated { capacity: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("unsupported method {0:?}")]
    InvalidMethod(String),

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("invalid client config: {reason}")]
    InvalidConfig { reason: String },

    #[error("invalid utf-8 from host: {0}")]
    Utf8(#[from] Utf8Error),
}

impl HttpError {
    pub fn invalid_header<S: ToString>(reason: S) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }

    pub fn invalid_request<S: ToString>(reason: S) -> Self {
        Self::InvalidRequest { reason: reason.to_string() }
    }

    pub fn invalid_config<S: ToString>(reason: S) -> Self {
        Self::InvalidConfig { reason: reason.to_string() }
    }

    /// Convert a nonzero host return value into an error.
    pub fn from_code(code: u32) -> Self {
        match HostErrorCode::from_raw(code) {
            Some(code) => Self::Host(code),
            None => Self::UnknownHostCode(code),
        }
    }

    /// The host code behind this error, if it came from the host.
    pub fn host_code(&self) -> Option<HostErrorCode> {
        match self {
            Self::Host(code) => Some(*code),
            _ => None,
        }
    }
}

/// Turn a raw host return value into a `Result`.
pub(crate) fn check(code: u32) -> Result<(), HttpError> {
    if code == 0 {
        Ok(())
    } else {
        Err(HttpError::from_code(code))
    }
}

//! Client-side buffer sizes.
//!
//! The host never grows a guest buffer; it fails with `BUFFER_TOO_SMALL`
//! instead. These capacities bound every buffer the accessor hands over.

use serde::Deserialize;

use crate::error::HttpError;

/// Default capacity for header buffers and body chunks.
pub const DEFAULT_BUFFER_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Buffer for a single header value in `Response::header_get`.
    pub header_value_capacity: usize,
    /// Buffer for the full header text in `Response::headers_get_all`.
    pub headers_capacity: usize,
    /// Chunk size used by `Response::body_read_all`.
    pub body_chunk_size: usize,
}

impl ClientConfig {
    pub const DEFAULT: ClientConfig = ClientConfig {
        header_value_capacity: DEFAULT_BUFFER_LEN,
        headers_capacity: DEFAULT_BUFFER_LEN,
        body_chunk_size: DEFAULT_BUFFER_LEN,
    };

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, HttpError> {
        let config: ClientConfig = serde_json::from_str(raw).map_err(HttpError::invalid_config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HttpError> {
        let fields = [
            ("header_value_capacity", self.header_value_capacity),
            ("headers_capacity", self.headers_capacity),
            ("body_chunk_size", self.body_chunk_size),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(HttpError::invalid_config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

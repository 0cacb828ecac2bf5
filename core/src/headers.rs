//! `key:value\n` header text, the format headers take across the boundary.
//!
//! Records are separated by `\n` and split on their first `:`, so values may
//! contain `:` but nothing may contain a line break and names may not contain
//! `:`. Both directions check this instead of producing ambiguous text.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::error::HttpError;

/// Serialize a header map, one `name:value\n` record per name, in the
/// map's iteration order.
///
/// The text holds one value per name, so a name with several values is
/// rejected. Use [`merge_repeated`] first to fold them into one.
pub fn encode(headers: &HeaderMap) -> Result<String, HttpError> {
    let mut out = String::new();
    for name in headers.keys() {
        let mut values = headers.get_all(name).iter();
        let name = name.as_str();
        if name.contains([':', '\r', '\n']) {
            return Err(HttpError::invalid_header(format!("name {name:?} cannot be encoded")));
        }
        let (Some(value), None) = (values.next(), values.next()) else {
            return Err(HttpError::invalid_header(format!("{name} has more than one value")));
        };
        let value = value.to_str().map_err(|_| {
            HttpError::invalid_header(format!("value of {name} is not visible ascii"))
        })?;
        if value.contains(['\r', '\n']) {
            return Err(HttpError::invalid_header(format!(
                "value of {name} contains a line break"
            )));
        }
        out.push_str(name);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    Ok(out)
}

/// Fold every name with several values into one `, `-separated value.
pub fn merge_repeated(headers: &HeaderMap) -> HeaderMap {
    let mut merged = HeaderMap::with_capacity(headers.keys_len());
    for name in headers.keys() {
        let mut joined = Vec::new();
        for (i, value) in headers.get_all(name).iter().enumerate() {
            if i > 0 {
                joined.extend_from_slice(b", ");
            }
            joined.extend_from_slice(value.as_bytes());
        }
        // Joining valid values with ", " always yields a valid value.
        if let Ok(value) = HeaderValue::from_bytes(&joined) {
            merged.insert(name.clone(), value);
        }
    }
    merged
}

/// Parse header text. Empty records are skipped; a repeated name keeps the
/// last value.
pub fn decode(text: &str) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    for record in text.split('\n').filter(|r| !r.is_empty()) {
        let (name, value) = record
            .split_once(':')
            .ok_or_else(|| HttpError::invalid_header(format!("record {record:?} has no ':'")))?;
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(HttpError::invalid_header)?;
        let value = HeaderValue::from_str(value).map_err(HttpError::invalid_header)?;
        headers.insert(name, value);
    }
    Ok(headers)
}

use crate::error::{Result, StoreError};

const ENCODED_SLASH: &str = "%2F";

/// Turns a raw URL path segment back into a literal document key.
///
/// Only `%2F` is decoded so that keys like `/v1/group` fit in one segment;
/// every other escape is kept verbatim. The only rejected input is an empty
/// segment.
pub fn decode_key(raw: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(StoreError::InvalidKey("empty key".to_string()));
    }
    Ok(raw.replace(ENCODED_SLASH, "/"))
}

//! Pagination tokens.
//!
//! A token is `base64(json(last_evaluated_key))`. Tokens are opaque to
//! clients and only ever decoded by this module.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::storage::{Item, Result};

/// Encode a page's last evaluated key. An absent or empty key yields no token.
pub fn encode(last_evaluated_key: Option<&Item>) -> Result<Option<String>> {
    match last_evaluated_key {
        Some(key) if !key.is_empty() => {
            let json = serde_json::to_vec(key)?;
            Ok(Some(STANDARD.encode(json)))
        }
        _ => Ok(None),
    }
}

/// Decode a token back into a start key.
///
/// Blank or undecodable tokens restart pagination from the beginning.
pub fn decode(token: Option<&str>) -> Option<Item> {
    let token = token.map(str::trim).filter(|t| !t.is_empty())?;

    let bytes = match STANDARD.decode(token) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Ignoring pagination token that is not base64");
            return None;
        }
    };

    match serde_json::from_slice::<Item>(&bytes) {
        Ok(key) if !key.is_empty() => Some(key),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Ignoring pagination token that is not a key map");
            None
        }
    }
}

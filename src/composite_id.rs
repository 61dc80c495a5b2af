//! Composite-ID codec.
//!
//! Event and Member ids handed to clients are `base64(partition_key & sort_key)`
//! using the standard alphabet with padding. `&` never appears in keys the
//! key codec produces, so decoding splits on its first occurrence.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::storage::Key;

/// Separator between the two key halves.
pub const SEPARATOR: char = '&';

/// Encode a primary key into an opaque id.
pub fn encode(partition_key: &str, sort_key: &str) -> String {
    STANDARD.encode(format!("{}{}{}", partition_key, SEPARATOR, sort_key))
}

/// Encode a [`Key`] into an opaque id.
pub fn encode_key(key: &Key) -> String {
    encode(&key.partition_key, &key.sort_key)
}

/// Decode an opaque id back into its key halves.
///
/// Returns `None` for anything that is not valid base64 of UTF-8 text
/// containing the separator with non-empty halves.
pub fn decode(id: &str) -> Option<(String, String)> {
    let bytes = STANDARD.decode(id.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (pk, sk) = text.split_once(SEPARATOR)?;
    if pk.is_empty() || sk.is_empty() {
        return None;
    }
    Some((pk.to_string(), sk.to_string()))
}

/// Decode an opaque id into a [`Key`].
pub fn decode_key(id: &str) -> Option<Key> {
    decode(id).map(|(pk, sk)| Key::new(pk, sk))
}

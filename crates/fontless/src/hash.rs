use base64::Engine as _;
use serde::Serialize;
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 10;

/// Short content hash used in asset filenames and cache keys.
///
/// The value is serialized to JSON, digested with SHA-256 and encoded as unpadded base64url; the
/// first ten alphanumeric characters are kept so the result is safe in paths and URLs.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> String {
    let json = serde_json::to_vec(value).unwrap_or_default();
    hash_bytes(&json)
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .encode(digest)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(HASH_LEN)
        .collect()
}

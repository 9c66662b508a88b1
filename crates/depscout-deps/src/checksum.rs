//! Checksum helpers

use base64::{engine::general_purpose, Engine as _};
use sha1::{Digest, Sha1};

/// Lowercase hex SHA-1 of `data`
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hex SHA-1 from an npm Subresource Integrity string.
///
/// An integrity value may list several space-separated hashes
/// (`sha512-... sha1-...`); only the `sha1-` entry is usable as a shasum.
pub fn sha1_from_integrity(integrity: &str) -> Option<String> {
    integrity
        .split_whitespace()
        .find_map(|entry| entry.strip_prefix("sha1-"))
        .and_then(|encoded| general_purpose::STANDARD.decode(encoded).ok())
        .filter(|bytes| bytes.len() == 20)
        .map(hex::encode)
}

/// Deterministic checksum for a CocoaPods pod: SHA-1 of `name_version_CocoaPods`
pub fn cocoapods_checksum(name: &str, version: &str) -> String {
    sha1_hex(format!("{name}_{version}_CocoaPods").as_bytes())
}

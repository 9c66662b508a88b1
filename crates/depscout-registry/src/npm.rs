//! npm registry document parsing

use crate::error::{Error, Result};
use serde_json::Value;

/// Pull the `shasum` out of an npm registry document.
///
/// Scoped packages are fetched as the full package document, so the shasum
/// lives under `versions.<version>.dist.shasum`. Unscoped lookups request the
/// version document directly and read `dist.shasum`.
pub fn extract_shasum(body: &Value, scoped: bool, version: &str, url: &str) -> Result<String> {
    let dist = if scoped {
        body.get("versions")
            .and_then(|v| v.get(version))
            .and_then(|v| v.get("dist"))
            .ok_or_else(|| malformed(url, format!("missing versions.{version}.dist")))?
    } else {
        body.get("dist")
            .ok_or_else(|| malformed(url, "missing dist"))?
    };

    dist.get("shasum")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(url, "missing dist.shasum"))
}

fn malformed(url: &str, reason: impl Into<String>) -> Error {
    Error::MalformedResponse {
        url: url.to_string(),
        reason: reason.into(),
    }
}

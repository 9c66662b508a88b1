//! Registry request types and authorization rules

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Token inserted into a scoped package's locator where the `/` between scope
/// and name belongs. It is replaced by [`SCOPED_SEPARATOR`] when the request
/// URL is built.
pub const SCOPE_SEPARATOR_PLACEHOLDER: &str = "{scope-separator}";

/// URL-encoded `/` as registries expect it for scoped package documents.
pub const SCOPED_SEPARATOR: &str = "%2F";

/// Which kind of registry serves a package.
///
/// Azure Artifacts feeds (`pkgs.dev.azure.com`, `*.visualstudio.com`) take the
/// access token as Basic credentials; everything else takes a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryKind {
    #[default]
    Default,
    AzureArtifacts,
}

impl RegistryKind {
    /// Classify a registry by the host of a resolved tarball or registry URL.
    pub fn from_locator(locator: &str) -> Self {
        let host = url::Url::parse(locator)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase));

        match host.as_deref() {
            Some(h) if h == "pkgs.dev.azure.com" || h.ends_with(".visualstudio.com") => {
                Self::AzureArtifacts
            }
            _ => Self::Default,
        }
    }
}

/// A single checksum lookup against a package registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShasumQuery {
    /// Registry URL of the package document, possibly holding
    /// [`SCOPE_SEPARATOR_PLACEHOLDER`]
    pub locator: String,
    /// Whether the package name carries an `@scope/` prefix
    pub scoped: bool,
    /// Exact version to look up
    pub version: String,
    pub kind: RegistryKind,
}

impl ShasumQuery {
    /// The URL actually requested
    pub fn request_url(&self) -> String {
        request_url(&self.locator, self.scoped)
    }
}

/// Build the request URL for a locator.
///
/// Scoped locators get their placeholder replaced; unscoped ones are used as-is.
pub fn request_url(locator: &str, scoped: bool) -> String {
    if scoped {
        locator.replace(SCOPE_SEPARATOR_PLACEHOLDER, SCOPED_SEPARATOR)
    } else {
        locator.to_string()
    }
}

/// `Authorization` header value for a registry, or `None` without a token.
pub fn authorization_header(kind: RegistryKind, token: Option<&str>) -> Option<String> {
    let token = token.filter(|t| !t.is_empty())?;
    Some(match kind {
        RegistryKind::AzureArtifacts => {
            format!("Basic {}", STANDARD.encode(format!("Bearer:{token}")))
        }
        RegistryKind::Default => format!("Bearer {token}"),
    })
}

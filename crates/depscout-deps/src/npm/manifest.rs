//! package.json parser
//!
//! Reads both project manifests and the manifests npm writes into
//! `node_modules`, which carry the `_resolved` / `_shasum` / `_integrity`
//! install metadata.

use crate::checksum::sha1_from_integrity;
use crate::npm::npm_artifact_id;
use crate::types::{Ecosystem, ManifestDescriptor};
use crate::{Error, Result};
use depscout_registry::{RegistryKind, SCOPE_SEPARATOR_PLACEHOLDER};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
struct PackageJson {
    #[serde(default)]
    name: String,

    #[serde(default)]
    version: String,

    #[serde(default)]
    private: bool,

    #[serde(default, rename = "_resolved")]
    resolved: Option<String>,

    #[serde(default, rename = "_shasum")]
    shasum: Option<String>,

    #[serde(default, rename = "_integrity")]
    integrity: Option<String>,

    #[serde(default)]
    dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "optionalDependencies")]
    optional_dependencies: BTreeMap<String, String>,
}

/// Parse package.json text into a descriptor.
///
/// `default_registry` is used for packages without an `_resolved` URL.
///
/// # Errors
/// Returns [`Error::InvalidManifest`] if the text is not a package.json object
pub fn parse_package_json(
    content: &str,
    path: &Path,
    default_registry: &str,
) -> Result<ManifestDescriptor> {
    let pkg: PackageJson = serde_json::from_str(content)
        .map_err(|e| Error::invalid_manifest(path, e.to_string()))?;

    let scoped = is_scoped(&pkg.name);
    let checksum = pkg
        .shasum
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| pkg.integrity.as_deref().and_then(sha1_from_integrity));

    let registry = if pkg.private {
        None
    } else {
        match pkg.resolved.as_deref() {
            Some(resolved) => registry_from_resolved(resolved, &pkg.name),
            None => Some(default_registry.trim_end_matches('/').to_string()),
        }
    };
    let registry_kind = registry
        .as_deref()
        .map(RegistryKind::from_locator)
        .unwrap_or_default();
    let registry_locator = registry
        .as_deref()
        .filter(|_| !pkg.name.is_empty() && !pkg.version.is_empty())
        .map(|registry| package_locator(registry, &pkg.name, &pkg.version));

    let mut dependencies = pkg.dependencies;
    for (name, range) in pkg.optional_dependencies {
        dependencies.entry(name).or_insert(range);
    }

    Ok(ManifestDescriptor {
        valid: !pkg.name.is_empty() && !pkg.version.is_empty(),
        artifact_id: npm_artifact_id(&pkg.name, &pkg.version),
        name: pkg.name,
        version: pkg.version,
        checksum,
        registry_locator,
        scoped,
        registry_kind,
        dependencies,
        path: path.to_path_buf(),
        ecosystem: Ecosystem::Npm,
    })
}

/// `@scope/name` packages
pub fn is_scoped(name: &str) -> bool {
    name.starts_with('@') && name.contains('/')
}

/// Registry base URL a tarball was resolved from.
///
/// `https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz` resolves to
/// `https://registry.npmjs.org`. Git and file URLs have no registry.
fn registry_from_resolved(resolved: &str, name: &str) -> Option<String> {
    if !(resolved.starts_with("http://") || resolved.starts_with("https://")) {
        return None;
    }
    let marker = format!("/{name}/-/");
    resolved
        .find(&marker)
        .map(|idx| resolved[..idx].to_string())
}

/// Registry URL of the package document to fetch.
///
/// Unscoped packages fetch the version document directly. Scoped packages
/// fetch the full package document with the scope separator left as a
/// placeholder to be percent-encoded at request time.
fn package_locator(registry: &str, name: &str, version: &str) -> String {
    match name.split_once('/') {
        Some((scope, bare)) if is_scoped(name) => {
            format!("{registry}/{scope}{SCOPE_SEPARATOR_PLACEHOLDER}{bare}")
        }
        _ => format!("{registry}/{name}/{version}"),
    }
}

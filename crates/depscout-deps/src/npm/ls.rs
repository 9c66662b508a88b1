//! `npm ls --json` collector

use crate::npm::{npm_node, NpmOptions};
use crate::process;
use crate::traits::Collector;
use crate::types::{CollectOutcome, DependencyNode};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct LsEntry {
    #[serde(default)]
    version: Option<String>,

    #[serde(default)]
    missing: bool,

    #[serde(default)]
    dependencies: BTreeMap<String, LsEntry>,
}

/// Parse `npm ls --json` output into a dependency forest.
///
/// Entries npm reports as missing, or without a version, are skipped
/// together with anything nested under them.
///
/// # Errors
/// Returns an error if the output is not JSON
pub fn parse_ls_output(output: &str) -> Result<Vec<DependencyNode>> {
    let root: LsEntry = serde_json::from_str(output)?;
    Ok(build_nodes(&root.dependencies))
}

fn build_nodes(entries: &BTreeMap<String, LsEntry>) -> Vec<DependencyNode> {
    entries
        .iter()
        .filter_map(|(name, entry)| {
            let version = entry.version.as_deref().filter(|v| !v.is_empty())?;
            if entry.missing {
                return None;
            }
            let mut node = npm_node(name, version);
            node.children = build_nodes(&entry.dependencies);
            Some(node)
        })
        .collect()
}

/// Collects dependencies through `npm ls`
#[derive(Debug, Clone)]
pub struct NpmLsCollector {
    options: NpmOptions,
}

impl NpmLsCollector {
    pub fn new(options: NpmOptions) -> Self {
        Self { options }
    }

    fn ls_args(&self) -> Vec<&'static str> {
        let mut args = vec!["ls", "--json"];
        if !self.options.include_dev_dependencies {
            args.push("--omit=dev");
        }
        args
    }
}

#[async_trait::async_trait]
impl Collector for NpmLsCollector {
    fn name(&self) -> &'static str {
        "npm ls"
    }

    async fn collect(&self, root: &Path) -> CollectOutcome {
        let output = match process::run("npm", &self.ls_args(), root, self.options.ls_timeout).await {
            Ok(output) => output,
            Err(e) => {
                tracing::info!(root = %root.display(), error = %e, "npm ls could not run");
                return CollectOutcome::failure(Vec::new());
            }
        };

        let parsed = parse_ls_output(&output.stdout);
        match (output.success, parsed) {
            (true, Ok(dependencies)) => CollectOutcome::success(dependencies),
            (false, Ok(dependencies)) if self.options.ignore_ls_errors => {
                tracing::debug!(root = %root.display(), code = ?output.code, "Ignoring npm ls exit status");
                CollectOutcome::success(dependencies)
            }
            (_, parsed) => {
                tracing::info!(
                    root = %root.display(),
                    code = ?output.code,
                    stderr = %output.stderr.trim(),
                    "npm ls failed"
                );
                CollectOutcome::failure(parsed.unwrap_or_default())
            }
        }
    }

    async fn prepare(&self, root: &Path) -> Result<()> {
        let mut args = vec!["install"];
        if self.options.ignore_scripts {
            args.push("--ignore-scripts");
        }
        let output = process::run("npm", &args, root, self.options.install_timeout).await?;
        if output.success {
            Ok(())
        } else {
            Err(Error::Command {
                program: "npm install".to_string(),
                message: format!("exited with {:?}: {}", output.code, output.stderr.trim()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_output() {
        let output = r#"{
            "name": "app",
            "version": "1.0.0",
            "dependencies": {
                "express": {
                    "version": "4.18.2",
                    "resolved": "https://registry.npmjs.org/express/-/express-4.18.2.tgz",
                    "dependencies": {
                        "accepts": {"version": "1.3.8"}
                    }
                },
                "left-pad": {"version": "1.3.0"}
            }
        }"#;

        let nodes = parse_ls_output(output).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].group_id, "express");
        assert_eq!(nodes[0].artifact_id, "express-4.18.2.tgz");
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].unique_dependency_name(), "accepts@1.3.8");
        assert!(nodes[0].checksum.is_empty());
    }

    #[test]
    fn test_missing_entries_are_skipped() {
        let output = r#"{
            "dependencies": {
                "gone": {"required": "^1.0.0", "missing": true},
                "noversion": {},
                "ok": {"version": "1.0.0"}
            }
        }"#;

        let nodes = parse_ls_output(output).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].group_id, "ok");
    }

    #[test]
    fn test_empty_project() {
        let nodes = parse_ls_output(r#"{"name": "app", "version": "1.0.0"}"#).unwrap();
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_ls_args_respect_dev_flag() {
        let collector = NpmLsCollector::new(NpmOptions::default());
        assert_eq!(collector.ls_args(), ["ls", "--json", "--omit=dev"]);

        let collector = NpmLsCollector::new(NpmOptions {
            include_dev_dependencies: true,
            ..NpmOptions::default()
        });
        assert_eq!(collector.ls_args(), ["ls", "--json"]);
    }
}

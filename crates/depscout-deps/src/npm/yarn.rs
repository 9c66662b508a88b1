//! `yarn list --json` collector

use crate::npm::{npm_node, NpmOptions};
use crate::process;
use crate::traits::Collector;
use crate::types::{CollectOutcome, DependencyNode};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct YarnLine {
    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    data: Option<YarnTreeData>,
}

#[derive(Debug, Deserialize)]
struct YarnTreeData {
    #[serde(default)]
    trees: Vec<YarnTree>,
}

#[derive(Debug, Deserialize)]
struct YarnTree {
    name: String,

    #[serde(default)]
    children: Vec<YarnTree>,

    #[serde(default)]
    shadow: bool,
}

/// Split a yarn tree name (`name@version`, `@scope/name@version`) at its last `@`
pub fn split_tree_name(name: &str) -> Option<(&str, &str)> {
    let idx = name.rfind('@').filter(|&idx| idx > 0)?;
    let (package, version) = (&name[..idx], &name[idx + 1..]);
    (!version.is_empty()).then_some((package, version))
}

/// Parse `yarn list --json` output into a dependency forest.
///
/// Yarn emits one JSON object per line; only the `tree` line carries the
/// dependency list. Shadow entries are references to packages listed
/// elsewhere and are skipped.
///
/// # Errors
/// Returns an error if no `tree` line is present
pub fn parse_list_output(output: &str) -> Result<Vec<DependencyNode>> {
    let tree = output
        .lines()
        .filter_map(|line| serde_json::from_str::<YarnLine>(line).ok())
        .find(|line| line.kind == "tree")
        .and_then(|line| line.data)
        .ok_or_else(|| Error::Other("yarn list output has no dependency tree".to_string()))?;

    Ok(build_nodes(&tree.trees))
}

fn build_nodes(trees: &[YarnTree]) -> Vec<DependencyNode> {
    trees
        .iter()
        .filter(|tree| !tree.shadow)
        .filter_map(|tree| {
            let (name, version) = split_tree_name(&tree.name)?;
            let mut node = npm_node(name, version);
            node.children = build_nodes(&tree.children);
            Some(node)
        })
        .collect()
}

/// Collects dependencies through `yarn list`
#[derive(Debug, Clone)]
pub struct YarnCollector {
    options: NpmOptions,
}

impl YarnCollector {
    pub fn new(options: NpmOptions) -> Self {
        Self { options }
    }

    fn list_args(&self) -> Vec<&'static str> {
        let mut args = vec!["list", "--json", "--no-progress"];
        if !self.options.include_dev_dependencies {
            args.push("--prod");
        }
        args
    }
}

#[async_trait::async_trait]
impl Collector for YarnCollector {
    fn name(&self) -> &'static str {
        "yarn list"
    }

    async fn collect(&self, root: &Path) -> CollectOutcome {
        let output =
            match process::run("yarn", &self.list_args(), root, self.options.ls_timeout).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::info!(root = %root.display(), error = %e, "yarn list could not run");
                    return CollectOutcome::failure(Vec::new());
                }
            };

        match (output.success, parse_list_output(&output.stdout)) {
            (true, Ok(dependencies)) => CollectOutcome::success(dependencies),
            (_, parsed) => {
                tracing::info!(root = %root.display(), code = ?output.code, "yarn list failed");
                CollectOutcome::failure(parsed.unwrap_or_default())
            }
        }
    }

    async fn prepare(&self, root: &Path) -> Result<()> {
        let mut args = vec!["install"];
        if self.options.ignore_scripts {
            args.push("--ignore-scripts");
        }
        let output = process::run("yarn", &args, root, self.options.install_timeout).await?;
        if output.success {
            Ok(())
        } else {
            Err(Error::Command {
                program: "yarn install".to_string(),
                message: format!("exited with {:?}: {}", output.code, output.stderr.trim()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tree_name() {
        assert_eq!(split_tree_name("lodash@4.17.21"), Some(("lodash", "4.17.21")));
        assert_eq!(split_tree_name("@babel/core@7.23.0"), Some(("@babel/core", "7.23.0")));
        assert_eq!(split_tree_name("@babel/core"), None);
        assert_eq!(split_tree_name("lodash@"), None);
    }

    #[test]
    fn test_parse_tree_line() {
        let output = concat!(
            r#"{"type":"info","data":"Visit https://yarnpkg.com for docs"}"#,
            "\n",
            r#"{"type":"tree","data":{"type":"list","trees":[{"name":"express@4.18.2","children":[{"name":"accepts@1.3.8","children":[]},{"name":"debug@2.6.9","shadow":true}]},{"name":"left-pad@1.3.0","children":[]}]}}"#,
        );

        let nodes = parse_list_output(output).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].unique_dependency_name(), "express@4.18.2");
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(nodes[0].children[0].group_id, "accepts");
    }

    #[test]
    fn test_output_without_tree_is_error() {
        assert!(parse_list_output(r#"{"type":"error","data":"boom"}"#).is_err());
    }

    #[test]
    fn test_list_args_respect_dev_flag() {
        let collector = YarnCollector::new(NpmOptions::default());
        assert_eq!(collector.list_args(), ["list", "--json", "--no-progress", "--prod"]);
    }
}

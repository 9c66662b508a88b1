//! Human-readable formatter for resolution reports.

use crate::cli::Report;
use colored::*;
use depscout_deps::{DependencyNode, ResolutionOutcome, ResolutionResult};
use std::fmt::Write;

pub struct HumanFormatter;

pub fn render(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "depscout Resolution Results".bold());
    let _ = writeln!(out, "===========================\n");
    let _ = writeln!(out, "Project: {}", report.project.display());
    let _ = writeln!(out, "Total dependencies: {}", report.node_count());

    for result in &report.results {
        render_result(&mut out, result);
    }
    out
}

fn render_result(out: &mut String, result: &ResolutionResult) {
    let _ = writeln!(
        out,
        "\n📦 {} {} ({} dependencies)",
        result.ecosystem.to_string().bright_blue().bold(),
        result.project_root.display(),
        result.node_count()
    );
    let outcome = match result.outcome {
        ResolutionOutcome::Resolved => "resolved by the package manager".green(),
        ResolutionOutcome::ZeroDependencies => "no dependencies".green(),
        ResolutionOutcome::ManifestFallback => {
            "package manager failed, rebuilt from manifests".yellow()
        }
    };
    let _ = writeln!(out, "  {outcome}");

    for node in &result.dependencies {
        render_node(out, node, 1);
    }

    if !result.failures.is_empty() {
        let _ = writeln!(
            out,
            "\n  {}",
            format!("Registry lookups failed ({}):", result.failures.len()).yellow().bold()
        );
        for failure in &result.failures {
            let _ = writeln!(
                out,
                "    {} {} - {}",
                "✗".red(),
                failure.dependency,
                failure.message
            );
        }
    }

    if !result.exclude_patterns.is_empty() {
        let _ = writeln!(out, "\n  Excluded from source scan:");
        for pattern in &result.exclude_patterns {
            let _ = writeln!(out, "    {pattern}");
        }
    }
}

fn render_node(out: &mut String, node: &DependencyNode, depth: usize) {
    let checksum = if node.checksum.is_empty() {
        "no checksum".dimmed().to_string()
    } else {
        node.checksum.dimmed().to_string()
    };
    let _ = writeln!(
        out,
        "{}{}@{} {}",
        "  ".repeat(depth + 1),
        node.group_id,
        node.version,
        checksum
    );
    for child in &node.children {
        render_node(out, child, depth + 1);
    }
}

//! Resolution orchestration for one project path.

use crate::cli::discovery::group_by_top_level;
use crate::error::CliError;
use depscout_config::DepscoutConfig;
use depscout_deps::{
    CocoaPodsEcosystem, NpmEcosystem, NpmOptions, PackageEcosystem, ResolutionResult, Resolver,
    ResolverOptions,
};
use depscout_fs::{DiscoveryOptions, FileSystem, NativeFileSystem};
use depscout_registry::{RegistryClient, RegistryClientConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which ecosystems to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EcosystemChoice {
    /// Every ecosystem with a manifest in the project
    Auto,
    Npm,
    #[value(name = "cocoapods")]
    CocoaPods,
}

impl EcosystemChoice {
    fn includes_npm(self) -> bool {
        matches!(self, Self::Auto | Self::Npm)
    }

    fn includes_cocoapods(self) -> bool {
        matches!(self, Self::Auto | Self::CocoaPods)
    }
}

/// Options for a resolution run, already merged with the config file
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub path: PathBuf,
    pub ecosystem: EcosystemChoice,
    pub config: DepscoutConfig,
    /// Never contact a registry
    pub offline: bool,
}

/// Everything resolved below one project path
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub project: PathBuf,
    pub results: Vec<ResolutionResult>,
}

impl Report {
    /// Total nodes across all results
    pub fn node_count(&self) -> usize {
        self.results.iter().map(ResolutionResult::node_count).sum()
    }
}

/// Resolve every selected ecosystem below `options.path`.
///
/// # Errors
/// [`CliError::NothingToResolve`] when no manifest of a selected ecosystem is
/// found; [`CliError::Interrupted`] when a resolver's worker pool fails.
pub async fn run_resolve(options: &ResolveOptions) -> Result<Report, CliError> {
    let config = &options.config;
    let fs = Arc::new(NativeFileSystem::new(&options.path)?);
    let project = fs.project_root().to_path_buf();

    let registry = registry_client(config, options.offline)?;
    let resolver_options = resolver_options(config);

    let mut results = Vec::new();
    if options.ecosystem.includes_npm() {
        let resolver = Resolver::new(
            NpmEcosystem::new(npm_options(config)),
            Arc::clone(&fs),
            registry.clone(),
            resolver_options.clone(),
        );
        results.extend(resolve_ecosystem(&resolver, &fs, &project).await?);
    }
    if options.ecosystem.includes_cocoapods() {
        let resolver = Resolver::new(
            CocoaPodsEcosystem::new(fs.clone()),
            Arc::clone(&fs),
            registry.clone(),
            resolver_options.clone(),
        );
        results.extend(resolve_ecosystem(&resolver, &fs, &project).await?);
    }

    if results.is_empty() {
        return Err(CliError::NothingToResolve(project));
    }
    Ok(Report { project, results })
}

async fn resolve_ecosystem<E: PackageEcosystem>(
    resolver: &Resolver<E, NativeFileSystem>,
    fs: &NativeFileSystem,
    project: &Path,
) -> Result<Vec<ResolutionResult>, CliError> {
    let ecosystem = resolver.ecosystem();
    let manifests = fs
        .find_files(
            project,
            &[ecosystem.manifest_file_name()],
            &resolver.manifest_excludes(),
            &DiscoveryOptions::default(),
        )
        .await?;
    tracing::info!(
        ecosystem = %ecosystem.ecosystem(),
        count = manifests.len(),
        "Discovered manifests"
    );

    let mut results = Vec::new();
    for group in group_by_top_level(project, manifests, ecosystem.vendor_folder()) {
        tracing::info!(
            ecosystem = %ecosystem.ecosystem(),
            root = %group.top_level_folder.display(),
            "Resolving"
        );
        let result = resolver
            .resolve(project, &group.top_level_folder, group.manifests)
            .await?;
        tracing::info!(
            root = %group.top_level_folder.display(),
            outcome = ?result.outcome,
            nodes = result.node_count(),
            "Resolved"
        );
        results.push(result);
    }
    Ok(results)
}

fn registry_client(config: &DepscoutConfig, offline: bool) -> Result<Option<RegistryClient>, CliError> {
    if offline || !config.registry.enabled {
        tracing::debug!("Registry lookups disabled");
        return Ok(None);
    }
    let client = RegistryClient::new(RegistryClientConfig {
        timeout: config.registry.timeout(),
        requests_per_second: config.registry.requests_per_second,
        access_token: config.npm.access_token().map(str::to_string),
    })?;
    Ok(Some(client))
}

fn resolver_options(config: &DepscoutConfig) -> ResolverOptions {
    ResolverOptions {
        worker_count: config.resolver.worker_count,
        ignore_source_files: config.resolver.ignore_source_files,
        run_pre_step: config.resolver.run_pre_step,
        extra_manifest_excludes: config.resolver.extra_manifest_excludes.clone(),
    }
}

fn npm_options(config: &DepscoutConfig) -> NpmOptions {
    NpmOptions {
        include_dev_dependencies: config.npm.include_dev_dependencies,
        ls_timeout: config.npm.ls_timeout(),
        install_timeout: config.npm.install_timeout(),
        ignore_ls_errors: config.npm.ignore_ls_errors,
        ignore_scripts: config.npm.ignore_scripts,
        yarn: config.npm.yarn,
        default_registry: config.npm.default_registry.clone(),
    }
}

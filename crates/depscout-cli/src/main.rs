//! depscout CLI - transitive dependency resolver for npm and CocoaPods projects.

use clap::Parser;
use colored::*;
use depscout_cli::cli::{interrupted, run_resolve, EcosystemChoice, ResolveOptions};
use depscout_cli::commands::{self, ConfigCommand};
use depscout_cli::formatters::{Formatter, HumanFormatter, JsonFormatter};
use depscout_cli::{logging, CliError};
use depscout_config::{ConfigManager, DepscoutConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "depscout")]
#[command(about = "Resolve the transitive dependency graph of npm and CocoaPods projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Project folder to resolve
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Ecosystems to resolve
    #[arg(short, long, value_enum, default_value = "auto")]
    ecosystem: EcosystemChoice,

    /// Output format
    #[arg(short, long = "output", value_enum, default_value = "human")]
    format: OutputFormat,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exclude all first-party source files, not only vendored copies
    #[arg(long)]
    ignore_source_files: bool,

    /// Run `npm install` / `yarn install` before collecting
    #[arg(long)]
    run_pre_step: bool,

    /// Collect with `yarn list` instead of `npm ls`
    #[arg(long)]
    yarn: bool,

    /// Registry access token
    #[arg(long, env = "NPM_ACCESS_TOKEN", hide_env_values = true)]
    npm_token: Option<String>,

    /// Never contact a package registry
    #[arg(long)]
    offline: bool,

    /// Enrichment worker count
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Manage depscout configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

impl Cli {
    /// Flags override the config file, which overrides defaults
    fn apply_overrides(&self, config: &mut DepscoutConfig) {
        if self.ignore_source_files {
            config.resolver.ignore_source_files = true;
        }
        if self.run_pre_step {
            config.resolver.run_pre_step = true;
        }
        if self.yarn {
            config.npm.yarn = true;
        }
        if let Some(token) = &self.npm_token {
            config.npm.access_token.clone_from(token);
        }
        if let Some(workers) = self.workers {
            config.resolver.worker_count = workers;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => return report_error(&CliError::Io(e)),
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(Command::Config { command }) = cli.command {
        return Ok(commands::handle_config_command(command, cli.config).await?);
    }

    let mut config = ConfigManager::resolve(cli.config.as_deref()).await?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let options = ResolveOptions {
        path: cli.path.clone(),
        ecosystem: cli.ecosystem,
        config,
        offline: cli.offline,
    };

    let report = tokio::select! {
        report = run_resolve(&options) => report?,
        Some(reason) = interrupted() => return Err(CliError::Interrupted(reason)),
    };

    match cli.format {
        OutputFormat::Human => HumanFormatter.format(&report),
        OutputFormat::Json => JsonFormatter.format(&report),
    }
}

fn report_error(error: &CliError) -> ExitCode {
    eprintln!("{} {error}", "Error:".red().bold());
    ExitCode::from(error.exit_code())
}

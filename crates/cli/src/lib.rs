pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pricerule_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "pricerule",
    about = "Commercial policy resolution CLI",
    long_about = "Resolve the most specific commercial policy for a sale context, validate order lines against its ceilings, and inspect configuration.",
    after_help = "Examples:\n  pricerule resolve --policies policies.json --context sale.json --all\n  pricerule validate --policies policies.toml --context sale.toml --line lines.json\n  pricerule config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to pricerule.toml (defaults to ./pricerule.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Select the most specific applicable policy for a context")]
    Resolve {
        #[arg(long, help = "Policy catalog (.json or .toml); overrides catalog.policies_path")]
        policies: Option<PathBuf>,
        #[arg(long, help = "Pricing context (.json or .toml)")]
        context: PathBuf,
        #[arg(long, help = "List every applicable policy ranked by score")]
        all: bool,
        #[arg(long, help = "Include per-field match traces")]
        trace: bool,
    },
    #[command(about = "Resolve the governing policy and check sale lines against its ceilings")]
    Validate {
        #[arg(long, help = "Policy catalog (.json or .toml); overrides catalog.policies_path")]
        policies: Option<PathBuf>,
        #[arg(long, help = "Pricing context (.json or .toml)")]
        context: PathBuf,
        #[arg(long, help = "Sale line or lines (.json or .toml)")]
        line: PathBuf,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let base_options = LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() };

    // a broken config is reported by the command itself; logging just falls back
    let config = AppConfig::load(base_options.clone()).unwrap_or_default();
    logging::init(&config);

    let result = match cli.command {
        Command::Resolve { policies, context, all, trace } => {
            commands::resolve::run(commands::resolve::ResolveRequest {
                load: with_policies(base_options, policies),
                context_path: context,
                all,
                trace,
            })
        }
        Command::Validate { policies, context, line } => {
            commands::validate::run(commands::validate::ValidateRequest {
                load: with_policies(base_options, policies),
                context_path: context,
                line_path: line,
            })
        }
        Command::Config => commands::config::run(base_options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn with_policies(options: LoadOptions, policies: Option<PathBuf>) -> LoadOptions {
    LoadOptions {
        overrides: ConfigOverrides { policies_path: policies, ..options.overrides },
        ..options
    }
}

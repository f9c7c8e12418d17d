pub mod commands;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use varisearch_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use varisearch_core::search::sorting::SortDirection;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Parser)]
#[command(
    name = "varisearch",
    about = "Variant-aware product listing search",
    long_about = "Evaluate variant conditions against a catalog snapshot and list products with their cheapest graduated price.",
    after_help = "Examples:\n  varisearch search --catalog catalog.json --query query.json --sort asc\n  varisearch validate --catalog catalog.json\n  varisearch config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Read configuration from this TOML file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a variant search and print the result rows as JSON")]
    Search {
        #[arg(long, help = "Catalog snapshot JSON file")]
        catalog: PathBuf,
        #[arg(long, help = "Query JSON file with conditions and optional sorting")]
        query: PathBuf,
        #[arg(long, help = "Sort by price (asc|desc), overriding the query file")]
        sort: Option<SortDirection>,
        #[arg(long, help = "Use the last graduation for in-stock variants")]
        use_last_graduation: bool,
        #[arg(long, help = "Hide variants without stock")]
        hide_no_in_stock: bool,
        #[arg(long, help = "Product count from which evaluation runs in parallel")]
        parallel_threshold: Option<usize>,
        #[arg(long, help = "Customer group whose price tiers are used")]
        customer_group: Option<String>,
        #[arg(long, default_value = "cli-search", help = "Correlation id attached to logs and errors")]
        correlation_id: String,
    },
    #[command(about = "Validate a catalog snapshot and print its size")]
    Validate {
        #[arg(long, help = "Catalog snapshot JSON file")]
        catalog: PathBuf,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Validate { .. } => "validate",
            Self::Config => "config",
        }
    }

    fn overrides(&self) -> ConfigOverrides {
        match self {
            Self::Search {
                use_last_graduation,
                hide_no_in_stock,
                parallel_threshold,
                customer_group,
                ..
            } => ConfigOverrides {
                use_last_graduation_for_cheapest_price: use_last_graduation.then_some(true),
                hide_no_in_stock: hide_no_in_stock.then_some(true),
                parallel_threshold: *parallel_threshold,
                customer_group: customer_group.clone(),
                ..ConfigOverrides::default()
            },
            Self::Validate { .. } | Self::Config => ConfigOverrides::default(),
        }
    }
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let result = execute(cli);

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", result.output).context("failed to write command output")?;
    Ok(ExitCode::from(result.exit_code))
}

pub fn execute(cli: Cli) -> CommandResult {
    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: cli.command.overrides(),
    };

    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                cli.command.name(),
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };
    init_logging(&config);

    match cli.command {
        Command::Search { catalog, query, sort, correlation_id, .. } => commands::search::run(
            &config,
            commands::search::SearchRequest {
                catalog: &catalog,
                query: &query,
                sort,
                correlation_id: &correlation_id,
            },
        ),
        Command::Validate { catalog } => commands::validate::run(&config, &catalog),
        Command::Config => commands::config::run(options),
    }
}

/// Logs go to stderr so stdout stays a single JSON document. A subscriber
/// installed earlier in the process is left in place.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

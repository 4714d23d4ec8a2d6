use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use streaming_comparator::catalog::Catalog;
use streaming_comparator::comparison::{build_comparison, ComparisonMatrix};
use streaming_comparator::config::{Config, ConfigOverrides};
use streaming_comparator::optimizer::{
    collect_teams, compute_optimal_combination, parse_teams, CoverageFailure,
    CoverageRequirement, PackageCombination, PriceBasis,
};
use streaming_comparator::output::csv::{combination_to_csv, comparison_to_csv};
use streaming_comparator::output::render_json;
use streaming_comparator::output::table::{
    render_combination_table, render_comparison_table, render_failure,
};
use streaming_comparator::server::{run_server, ApiState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "streaming-comparator",
    about = "Cheapest streaming package combination for the games of your teams"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long = "data-dir")]
    data_dir: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
struct QueryArgs {
    /// Team label; repeat the flag for more teams. `compare` also splits
    /// values on commas and lists every game when no team is given.
    #[arg(short, long)]
    teams: Vec<String>,
    /// any | live | highlights | live_and_highlights
    #[arg(long)]
    coverage: Option<CoverageRequirement>,
    /// monthly | yearly_subscription
    #[arg(long = "price-basis")]
    price_basis: Option<PriceBasis>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Optimize {
        #[command(flatten)]
        query: QueryArgs,
    },
    Compare {
        #[command(flatten)]
        query: QueryArgs,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let query = match &cli.command {
        Commands::Optimize { query } | Commands::Compare { query } => Some(query),
        _ => None,
    };
    config.apply_overrides(ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        coverage: query.and_then(|q| q.coverage),
        price_basis: query.and_then(|q| q.price_basis),
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }

    let catalog = Catalog::load_dir(&config.resolved_data_dir(), &config.data)?;

    match &cli.command {
        Commands::Optimize { query } => {
            let teams = collect_teams(query.teams.iter().map(String::as_str));
            let outcome = compute_optimal_combination(&catalog, &teams, &config.optimizer)?;
            print_combination(&outcome, cli.output)?;
        }
        Commands::Compare { query } => {
            let teams = parse_teams(query.teams.iter().map(String::as_str));
            let outcome = build_comparison(&catalog, &teams, &config.optimizer)?;
            print_comparison(&outcome, cli.output)?;
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            info!(
                coverage = %config.optimizer.coverage,
                price_basis = %config.optimizer.price_basis,
                "serving catalog"
            );
            run_server(ApiState::new(config, Arc::new(catalog)), addr).await?;
        }
        Commands::Config { .. } => {}
    }
    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn print_combination(
    outcome: &Result<PackageCombination, CoverageFailure>,
    format: OutputFormat,
) -> Result<()> {
    let combination = match outcome {
        Ok(combination) => combination,
        Err(failure) => return print_failure(failure, format),
    };
    match format {
        OutputFormat::Table => println!("{}", render_combination_table(combination)),
        OutputFormat::Json => println!("{}", render_json(combination)?),
        OutputFormat::Csv => print!("{}", combination_to_csv(combination)?),
    }
    Ok(())
}

fn print_comparison(
    outcome: &Result<ComparisonMatrix, CoverageFailure>,
    format: OutputFormat,
) -> Result<()> {
    let matrix = match outcome {
        Ok(matrix) => matrix,
        Err(failure) => return print_failure(failure, format),
    };
    match format {
        OutputFormat::Table => println!("{}", render_comparison_table(matrix)),
        OutputFormat::Json => println!("{}", render_json(matrix)?),
        OutputFormat::Csv => print!("{}", comparison_to_csv(matrix)?),
    }
    Ok(())
}

fn print_failure(failure: &CoverageFailure, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!(
            "{}",
            render_json(&serde_json::json!({
                "reason": failure,
                "error": failure.to_string(),
            }))?
        ),
        OutputFormat::Table | OutputFormat::Csv => eprintln!("{}", render_failure(failure)),
    }
    Ok(())
}

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use leadsheet_pipeline::{LeadPipeline, PipelineConfig, ProviderMode, StageReport};
use leadsheet_storage::StorageError;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "leadsheet")]
#[command(about = "Builds the ANZ finance and insurance tech-hiring lead workbook")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Root of the raw/processed/final stage directories
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// `simulated` or `live`
    #[arg(long, global = true)]
    provider: Option<ProviderMode>,

    /// Seed for the simulated provider
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, global = true)]
    contact_cap: Option<usize>,

    #[arg(long, global = true)]
    top_n: Option<usize>,

    /// trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Commands {
    /// Build the company table from the built-in catalog
    Collect,
    /// Check DevOps and developer hiring for every collected company
    Verify,
    /// Find executive contacts for hiring companies
    Enrich,
    /// Write the final workbook, snapshot and brief
    Consolidate,
    /// Run all four stages in order
    Run,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let exit_code = match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            match err.downcast_ref::<StorageError>() {
                Some(missing @ StorageError::MissingInput { .. }) => eprintln!("{missing}"),
                _ => eprintln!("error: {err:#}"),
            }
            1
        }
    };
    std::process::exit(exit_code);
}

fn config_from(cli: &Cli) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(cap) = cli.contact_cap {
        config.contact_cap = cap;
    }
    if let Some(top_n) = cli.top_n {
        config.top_n = top_n;
    }
    config
}

async fn execute(cli: Cli) -> Result<()> {
    let pipeline = LeadPipeline::new(config_from(&cli))?;

    let report = match cli.command.unwrap_or(Commands::Run) {
        Commands::Collect => pipeline.collect().await?,
        Commands::Verify => pipeline.verify().await?,
        Commands::Enrich => pipeline.enrich().await?,
        Commands::Consolidate => pipeline.consolidate().await?,
        Commands::Run => {
            let summary = pipeline.run_all().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for stage in &summary.stages {
                    print_stage(stage);
                }
                println!(
                    "run complete: run_id={} provider={} data_dir={}",
                    summary.run_id,
                    summary.provider,
                    pipeline.layout().root().display()
                );
            }
            return Ok(());
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_stage(&report);
    }
    Ok(())
}

fn print_stage(report: &StageReport) {
    println!(
        "{} complete: rows_in={} rows_out={} outputs={}",
        report.stage,
        report.rows_in,
        report.rows_out,
        report.outputs.join(",")
    );
}

fn init_logging(cli: &Cli) {
    let level = match &cli.log_level {
        Some(level) => parse_level(level),
        None => parse_level(&env::var("LEADSHEET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())),
    };

    let filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = level.to_string().to_lowercase();
        EnvFilter::try_new(format!(
            "{level},h2=warn,hyper=warn,reqwest=warn,html5ever=warn,selectors=warn"
        ))
        .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!("invalid log level '{other}', defaulting to info");
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_defaults() {
        let cli = Cli::parse_from([
            "leadsheet",
            "--data-dir",
            "/tmp/leads",
            "--provider",
            "live",
            "--seed",
            "9",
            "--top-n",
            "5",
            "verify",
        ]);
        let config = config_from(&cli);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/leads"));
        assert_eq!(config.provider, ProviderMode::Live);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.top_n, 5);
        assert!(matches!(cli.command, Some(Commands::Verify)));
    }

    #[test]
    fn missing_subcommand_means_full_run() {
        let cli = Cli::parse_from(["leadsheet"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("loud"), Level::INFO);
    }
}

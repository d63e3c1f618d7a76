use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use repomentor::{logging, server, AcquisitionStrategy, AnalysisPipeline, Config};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one repository and print the result as JSON
    Analyze(AnalyzeArgs),
    /// Run the HTTP API
    Serve(ServeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Repository URL, e.g. https://github.com/owner/name
    url: String,

    /// Acquisition strategy (remote or clone); overrides the configuration
    #[arg(short, long)]
    strategy: Option<AcquisitionStrategy>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind, e.g. 0.0.0.0:8000
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Analyze(args) => analyze(config, args).await,
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                config.server.bind_address = bind;
            }
            server::run(config).await?;
            Ok(())
        }
    }
}

async fn analyze(config: Config, args: AnalyzeArgs) -> Result<()> {
    config.validate()?;
    let strategy = args.strategy.unwrap_or(config.strategy);
    let pipeline = AnalysisPipeline::with_strategy(&config, strategy)?;
    info!("Analyzing {} with the {} strategy", args.url, pipeline.strategy());

    let response = pipeline
        .analyze(&args.url)
        .await
        .with_context(|| format!("Analysis of {} failed", args.url))?;

    let output = if args.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{}", output);
    Ok(())
}

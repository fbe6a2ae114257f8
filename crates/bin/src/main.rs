//! Tangency CLI binary.
//!
//! Analyzes a portfolio against a price history and recommends the
//! maximum-Sharpe allocation.

mod integration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use integration::loader::{load_config, load_holdings, load_prices};
use std::path::{Path, PathBuf};
use std::process;
use tangency::output::{ExportFormat, Exporter, Report};
use tangency::{AnalysisConfig, PortfolioAnalyzer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tangency")]
#[command(about = "Tangency: mean-variance portfolio analysis", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze current holdings: performance, risk and recommendations
    Analyze {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Compare current holdings with the maximum-Sharpe allocation
    Optimize {
        #[command(flatten)]
        inputs: Inputs,

        /// Required annualized return of the recommended allocation
        #[arg(long)]
        target_return: Option<f64>,
    },
}

#[derive(Args)]
struct Inputs {
    /// Price table CSV (date column followed by one column per symbol)
    #[arg(long)]
    prices: PathBuf,

    /// Holdings CSV (symbol,quantity,price)
    #[arg(long)]
    holdings: PathBuf,

    /// JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Annual risk-free rate (overrides the config file)
    #[arg(long)]
    risk_free_rate: Option<f64>,

    /// Return periods per year (overrides the config file)
    #[arg(long)]
    periods_per_year: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write the result to this file (.csv or .json)
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

impl Inputs {
    fn config(&self) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(rate) = self.risk_free_rate {
            config.evaluation.risk_free_rate = rate;
        }
        if let Some(periods) = self.periods_per_year {
            config.evaluation.periods_per_year = periods;
        }
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { inputs } => analyze(&inputs)?,
        Commands::Optimize {
            inputs,
            target_return,
        } => optimize(&inputs, target_return)?,
    }

    Ok(())
}

fn analyze(inputs: &Inputs) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = PortfolioAnalyzer::new(inputs.config()?);
    let portfolio = load_holdings(&inputs.holdings)?;
    let prices = load_prices(&inputs.prices, &portfolio.symbols())?;

    let analysis = analyzer.analyze(&portfolio, &prices)?;

    match inputs.format {
        OutputFormat::Text => print!("{}", analysis.to_ascii_table()),
        OutputFormat::Markdown => print!("{}", analysis.to_markdown()),
        OutputFormat::Json => {
            let report = Report::from_serializable(
                "analyze".to_string(),
                portfolio.symbols(),
                &analysis,
            )?;
            println!("{}", report.to_json()?);
        }
    }

    if let Some(path) = &inputs.export {
        analysis.export_to_file(path, export_format(path))?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn optimize(
    inputs: &Inputs,
    target_return: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = PortfolioAnalyzer::new(inputs.config()?);
    let portfolio = load_holdings(&inputs.holdings)?;
    let prices = load_prices(&inputs.prices, &portfolio.symbols())?;

    let report = analyzer.optimize(&portfolio, &prices, target_return)?;

    match inputs.format {
        OutputFormat::Text => {
            if let Some(target) = target_return {
                println!("Target return: {:.2}%", target * 100.0);
            }
            print!("{}", report.to_ascii_table());
        }
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Json => {
            let envelope = Report::from_serializable(
                "optimize".to_string(),
                portfolio.symbols(),
                &report,
            )?;
            println!("{}", envelope.to_json()?);
        }
    }

    if let Some(path) = &inputs.export {
        report.export_to_file(path, export_format(path))?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn export_format(path: &Path) -> ExportFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
        _ => ExportFormat::PrettyJson,
    }
}

use casebase::config::load_engine_config;
use casebase_api::{AppState, RestApi};
use casebase_core::{Attribute, DatasetLoader, Error, MetricQuery, DEFAULT_MAX_ROWS};
use casebase_similarity::{
    Casebase, EngineConfig, SearchResponse, SimilarityMode, WeightVector,
};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Case-based retrieval over a birth-weight casebase
#[derive(Parser, Debug)]
#[command(name = "casebase")]
#[command(about = "Find the historical cases most similar to a described one", long_about = None)]
struct Args {
    /// Path to the dataset CSV
    #[arg(short, long, env = "CASEBASE_DATASET", default_value = "./data/babies.csv", global = true)]
    dataset: PathBuf,

    /// Path to an engine configuration file (JSON)
    #[arg(short, long, env = "CASEBASE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Maximum number of dataset rows accepted
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS, global = true)]
    max_rows: usize,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one search and print the requested page
    Search(SearchArgs),
}

#[derive(ClapArgs, Debug)]
struct SearchArgs {
    /// Gestation length in days
    #[arg(long)]
    gestation: f64,

    /// 0 for a first pregnancy, 1 otherwise
    #[arg(long)]
    parity: f64,

    /// Mother's age in years
    #[arg(long)]
    age: f64,

    /// Mother's height in centimeters
    #[arg(long)]
    height_cm: f64,

    /// Mother's weight in kilograms
    #[arg(long)]
    weight_kg: f64,

    /// 1 if the mother smokes, 0 otherwise
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    smoke: u8,

    /// Weight override, e.g. `--weight gestation=2` (repeatable)
    #[arg(long = "weight", value_parser = parse_weight)]
    weights: Vec<(Attribute, f64)>,

    /// Aggregation mode (overrides the configured one)
    #[arg(long)]
    mode: Option<SimilarityMode>,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Results per page (overrides the configured one)
    #[arg(long)]
    page_size: Option<NonZeroUsize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn parse_weight(s: &str) -> Result<(Attribute, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ATTRIBUTE=WEIGHT, got '{}'", s))?;
    let attr: Attribute = name.trim().parse().map_err(|e: Error| e.to_string())?;
    let weight: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight '{}' for {}", value, attr))?;
    Ok((attr, weight))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => args.log_level.as_str(),
        _ => "info",
    };

    // Logs go to stderr so search output can be piped
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => load_engine_config(path)?,
        None => EngineConfig::default(),
    };
    let loader = DatasetLoader::new(args.max_rows);

    match args.command {
        Command::Serve { port } => serve(args.dataset, loader, config, port).await,
        Command::Search(search_args) => search(&args.dataset, &loader, config, search_args),
    }
}

async fn serve(dataset: PathBuf, loader: DatasetLoader, config: EngineConfig, port: u16) -> anyhow::Result<()> {
    info!("Starting casebase v{}", env!("CARGO_PKG_VERSION"));
    info!("Dataset: {:?}", dataset);
    info!("Mode: {}", config.mode);

    let state = Arc::new(AppState::load(dataset, loader, config)?);
    match state.current() {
        Some(casebase) => info!("Casebase prepared with {} cases", casebase.len()),
        None => warn!("Serving an empty casebase"),
    }

    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn search(dataset: &Path, loader: &DatasetLoader, config: EngineConfig, args: SearchArgs) -> anyhow::Result<()> {
    let mode = args.mode.unwrap_or(config.mode);
    let page_size = match args.page_size {
        Some(size) => size,
        None => config.page_size_nonzero()?,
    };

    let query = MetricQuery {
        gestation: args.gestation,
        parity: args.parity,
        age: args.age,
        height_cm: args.height_cm,
        weight_kg: args.weight_kg,
        smoke: f64::from(args.smoke),
    };
    let overrides: WeightVector = args.weights.into_iter().collect();
    let weights = config.default_weights.merged(&overrides);

    let records = loader.load_path(dataset)?;
    let response = match Casebase::prepare(records, config) {
        Ok(casebase) => {
            let ctx = casebase
                .context(query.to_query(), weights)
                .with_mode(mode)
                .with_page(args.page)
                .with_page_size(page_size);
            SearchResponse::from_result(&casebase.evaluate(&ctx)?)
        }
        Err(Error::EmptyDataset) => {
            warn!("Dataset {:?} has no complete cases", dataset);
            SearchResponse::empty(mode, args.page, page_size.get())
        }
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Table => print_table(&response),
    }
    Ok(())
}

fn print_table(response: &SearchResponse) {
    for warning in &response.warnings {
        println!("warning: {}", warning);
    }

    if response.result.is_empty() {
        println!("No cases available.");
        return;
    }

    println!(
        "{:>4}  {:>6}  {:>9}  {:>6}  {:>4}  {:>10}  {:>10}  {:>6}  {:>15}  {:>13}",
        "Rank", "Case", "Gestation", "Parity", "Age", "Height(cm)", "Weight(kg)", "Smoker", "Birth weight(g)", "Similarity(%)"
    );
    for r in &response.result {
        println!(
            "{:>4}  {:>6}  {:>9}  {:>6}  {:>4}  {:>10.1}  {:>10.1}  {:>6}  {:>15}  {:>13.2}",
            r.rank,
            r.id.0,
            r.gestation,
            r.parity,
            r.age,
            r.height_cm,
            r.weight_kg,
            if r.smoke { "yes" } else { "no" },
            r.birth_weight_g,
            r.similarity,
        );
    }

    let links: Vec<String> = response
        .pages
        .iter()
        .map(|&p| if p == response.page { format!("[{}]", p) } else { p.to_string() })
        .collect();
    println!();
    println!(
        "Page {} of {} ({} cases, {}): {}",
        response.page,
        response.total_pages,
        response.total_records,
        response.mode,
        links.join(" ")
    );
    if response.page != response.requested_page {
        println!("(requested page {} is out of range)", response.requested_page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("gestation=2").unwrap(), (Attribute::Gestation, 2.0));
        assert_eq!(parse_weight(" smoke = 0.5 ").unwrap(), (Attribute::Smoke, 0.5));
        assert!(parse_weight("gestation").is_err());
        assert!(parse_weight("bwt=1").is_err());
        assert!(parse_weight("age=heavy").is_err());
    }

    #[test]
    fn test_cli_parses_search() {
        let args = Args::try_parse_from([
            "casebase", "search",
            "--gestation", "280", "--parity", "0", "--age", "27",
            "--height-cm", "162", "--weight-kg", "55", "--smoke", "1",
            "--weight", "age=3", "--mode", "euclidean", "--format", "json",
        ])
        .unwrap();

        let Command::Search(search) = args.command else {
            panic!("expected search command");
        };
        assert_eq!(search.smoke, 1);
        assert_eq!(search.weights, vec![(Attribute::Age, 3.0)]);
        assert_eq!(search.mode, Some(SimilarityMode::WeightedEuclideanDistance));
        assert_eq!(search.format, OutputFormat::Json);
        assert_eq!(search.page, 1);
    }

    #[test]
    fn test_cli_rejects_bad_smoke() {
        let result = Args::try_parse_from([
            "casebase", "search",
            "--gestation", "280", "--parity", "0", "--age", "27",
            "--height-cm", "162", "--weight-kg", "55", "--smoke", "2",
        ]);
        assert!(result.is_err());
    }
}

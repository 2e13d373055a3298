pub mod config;
pub mod model;
pub mod search;
pub mod storage;

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;

use config::Config;
use model::types::StructuredFilter;
use search::SearchClient;
use search::card::ListingCard;
use search::intent::extract;
use search::request::{RequestError, SearchRequest, SearchResponse};
use search::summary::SummaryStats;
use storage::{ListingTable, LoadError, load_table};

/// Version of the JSON shapes printed by `search --json` and `request`.
pub const API_VERSION: u32 = 1;

/// Env var holding an `EnvFilter` directive; overrides `-v`.
pub const LOG_ENV: &str = "PROPSEARCH_LOG";

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "propsearch",
    version,
    about = "Free-text search over property listings"
)]
pub struct Cli {
    /// Config file (defaults to the platform config dir's config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pre-joined listings file (JSON array or JSON Lines)
    #[arg(long, global = true, conflicts_with = "tables_dir")]
    pub listings: Option<PathBuf>,

    /// Directory with project.csv and the three Project*.csv tables
    #[arg(long, global = true)]
    pub tables_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// When to colorize human output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Never,
    Always,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search listings with a free-text query
    Search {
        /// Query text, e.g. "3BHK flat in Pune under ₹1.2 Cr"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum results (defaults to config max_results)
        #[arg(long)]
        limit: Option<usize>,

        /// Print the JSON response instead of human output
        #[arg(long)]
        json: bool,
    },
    /// Show the filters extracted from a query
    Extract {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Answer one JSON request read from a file or stdin
    Request {
        /// Request file; reads stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print version and build metadata
    ApiVersion {
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    apply_color(cli.color);

    match cli.command {
        Commands::Search {
            ref query,
            limit,
            json,
        } => {
            let config = load_config(&cli)?;
            let client = open_client(&config)?;
            let request = SearchRequest::new(query.join(" "), limit.unwrap_or(config.max_results));
            run_search(&client, &request, json)
        }
        Commands::Extract { ref query, json } => {
            let config = load_config(&cli)?;
            let table = match config.source() {
                Ok(source) => load_table(&source, &config.cities)?,
                Err(LoadError::NoSource) => ListingTable::default(),
                Err(e) => return Err(e.into()),
            };
            let filter = extract(&query.join(" "), table.vocabulary());
            print_filter(&filter, json)
        }
        Commands::Request { ref input } => {
            let config = load_config(&cli)?;
            run_request(&config, input.as_deref())
        }
        Commands::ApiVersion { json } => print_api_version(json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "propsearch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

/// Install the stderr subscriber. `PROPSEARCH_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn apply_color(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto if !std::io::stdout().is_terminal() => {
            colored::control::set_override(false);
        }
        ColorMode::Auto => {}
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.listings {
        config.listings = Some(path.clone());
        config.tables_dir = None;
    }
    if let Some(dir) = &cli.tables_dir {
        config.tables_dir = Some(dir.clone());
        config.listings = None;
    }
    Ok(config)
}

fn open_client(config: &Config) -> Result<SearchClient> {
    let source = config.source()?;
    let table = load_table(&source, &config.cities)?;
    Ok(SearchClient::new(Arc::new(table)))
}

fn run_search(client: &SearchClient, request: &SearchRequest, json: bool) -> Result<()> {
    let (response, stats) = client.search_with_stats(request);
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }
    print_human(&response, &stats);
    Ok(())
}

fn run_request(config: &Config, input: Option<&Path>) -> Result<()> {
    let body = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading request from {}", path.display()))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("reading request from stdin")?;
            body
        }
    };

    let request = match SearchRequest::from_json(&body, config.max_results) {
        Ok(request) => request,
        Err(err) => {
            println!("{}", json!({ "error": err.to_string() }));
            return Err(err.into());
        }
    };
    let client = open_client(config)?;
    let response: SearchResponse = client.search(&request);
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

fn print_human(response: &SearchResponse, stats: &SummaryStats) {
    println!("{}", response.summary);
    if !stats.possession_breakdown.is_empty() {
        let breakdown = stats
            .possession_breakdown
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{} {}", "Possession:".dimmed(), breakdown);
    }
    for (idx, card) in response.results.iter().enumerate() {
        println!();
        print_card(idx + 1, card);
    }
}

fn print_card(rank: usize, card: &ListingCard) {
    let title = card.title.as_deref().unwrap_or("(untitled)");
    let price = card.price.as_deref().unwrap_or("price on request");
    println!("{:>2}. {}  {}", rank, title.bold(), price.green());

    let details: Vec<&str> = [
        Some(card.city_locality.as_str()).filter(|s| !s.is_empty()),
        card.bhk.as_deref(),
        card.possession_status.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        println!("    {}", details.join(" | "));
    }
    if !card.amenities.is_empty() {
        println!("    {}", card.amenities.join(", ").dimmed());
    }
    println!("    {}", card.cta_url.cyan());
}

fn print_filter(filter: &StructuredFilter, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(filter)?);
        return Ok(());
    }
    let budget = filter.budget.map(|b| match b {
        model::types::Budget::Ceiling(max) => format!("≤ {max}"),
        model::types::Budget::Range { min, max } => format!("{min}..={max}"),
    });
    let fields = [
        ("city", filter.city.clone()),
        ("bhk", filter.bhk.map(|b| b.to_string())),
        ("budget", budget),
        ("possession", filter.possession.map(|p| p.to_string())),
        ("locality", filter.locality.clone()),
        ("project_name", filter.project_name.clone()),
    ];
    for (name, value) in fields {
        match value {
            Some(value) => println!("{:<13}{}", format!("{name}:").bold(), value),
            None => println!("{:<13}{}", format!("{name}:").bold(), "-".dimmed()),
        }
    }
    Ok(())
}

fn print_api_version(json: bool) -> Result<()> {
    let crate_version = env!("CARGO_PKG_VERSION");
    let build_timestamp = option_env!("VERGEN_BUILD_TIMESTAMP");
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE");
    if json {
        let payload = json!({
            "api_version": API_VERSION,
            "crate_version": crate_version,
            "build_timestamp": build_timestamp,
            "target": target,
        });
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        println!("propsearch {crate_version} (api v{API_VERSION})");
        if let Some(ts) = build_timestamp {
            println!("built {ts}");
        }
        if let Some(target) = target {
            println!("target {target}");
        }
    }
    Ok(())
}

/// Process exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<RequestError>().is_some() {
        4
    } else if err.downcast_ref::<LoadError>().is_some() {
        3
    } else {
        1
    }
}

//! CLI entry point for the thesis search service.
//!
//! Provides commands for initializing configuration, building the index,
//! one-shot queries, and running the HTTP service.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thesis_search::io::{ExitCode, JsonResponse, OutputFormat};
use thesis_search::{
    FastEmbedder, HttpThesisSource, IndexStore, SearchEngine, SearchError, Settings,
};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "thesis-search",
    version,
    about = "Semantic search over a thesis repository",
    styles = clap_cargo_style(),
    after_help = "Examples:\n  thesis-search init\n  thesis-search index\n  thesis-search search \"machine learning for climate\" --limit 10\n  thesis-search serve"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .thesis-search directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Build (or rebuild) the index from the thesis store
    #[command(about = "Fetch theses, embed abstracts, persist the index pair")]
    Index {
        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a one-shot semantic query against the persisted index
    #[command(
        about = "Query the index and print ranked results",
        after_help = "Results are ranked by ascending distance: a lower score means a closer match."
    )]
    Search {
        /// Query text
        query: String,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP search service
    #[command(about = "Serve /search, /reindex, /status over HTTP")]
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .thesis-search/settings.toml")]
    Config,
}

fn load_settings() -> Settings {
    match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            ExitCode::ConfigError.exit()
        }
    }
}

/// Wire the engine from settings. Embedder init downloads the model on
/// first use, hence the progress switch for interactive commands.
fn build_engine(settings: &Settings, show_download_progress: bool) -> Result<Arc<SearchEngine>, SearchError> {
    let embedder = FastEmbedder::new(
        &settings.embedding.model,
        settings.embedding.cache_dir.clone(),
        show_download_progress,
    )?;
    let source = HttpThesisSource::new(&settings.source.base_url, settings.source_timeout())?;

    Ok(Arc::new(SearchEngine::new(
        Arc::new(embedder),
        Arc::new(source),
        IndexStore::new(settings.index_path.clone()),
        settings.query.default_limit,
    )))
}

fn report_error(err: &SearchError, format: OutputFormat) -> ! {
    if format.is_json() {
        JsonResponse::<()>::error(err).print();
    } else {
        eprintln!("Error: {err}");
        for suggestion in err.recovery_suggestions() {
            eprintln!("  hint: {suggestion}");
        }
    }
    ExitCode::from(err).exit()
}

async fn run_index(settings: Settings, format: OutputFormat) {
    let engine = match build_engine(&settings, !format.is_json()) {
        Ok(engine) => engine,
        Err(e) => report_error(&e, format),
    };

    let spinner = if format.is_json() {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
        );
        spinner.set_message(format!(
            "Fetching theses from {} and embedding abstracts...",
            settings.source.base_url
        ));
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    };

    let start = Instant::now();
    let result = engine.rebuild().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match result {
        Ok(stats) => {
            if format.is_json() {
                JsonResponse::success(&stats).print();
            } else {
                eprintln!(
                    "Indexed {} theses (dimension {}) in {:.1}s",
                    stats.documents,
                    stats.dimension,
                    start.elapsed().as_secs_f32()
                );
                eprintln!("Index written to {}", settings.index_path.display());
            }
        }
        Err(e) => report_error(&e, format),
    }
}

async fn run_search(settings: Settings, query: String, limit: Option<usize>, format: OutputFormat) {
    let engine = match build_engine(&settings, false) {
        Ok(engine) => engine,
        Err(e) => report_error(&e, format),
    };

    // One-shot queries answer from the persisted pair only; building an
    // index implicitly here would hide ingestion failures.
    match engine.load_persisted() {
        Ok(true) => {}
        Ok(false) => report_error(&SearchError::IndexNotReady, format),
        Err(e) => report_error(&e, format),
    }

    match engine.query(&query, limit) {
        Ok(results) => {
            if format.is_json() {
                JsonResponse::success(&results).print();
            } else if results.is_empty() {
                println!("No results.");
            } else {
                println!("Results for '{query}' (lower score = closer match):\n");
                for (rank, result) in results.iter().enumerate() {
                    println!(
                        "{:>3}. {} by {} (id {}, score {:.4})",
                        rank + 1,
                        result.title,
                        result.author,
                        result.id,
                        result.relevance_score
                    );
                }
            }
        }
        Err(e) => report_error(&e, format),
    }
}

async fn run_serve(settings: Settings, bind: Option<String>) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if settings.debug {
                    "thesis_search=debug".into()
                } else {
                    "thesis_search=info".into()
                }
            }),
        )
        .init();

    let engine = build_engine(&settings, true)?;

    // Load the persisted pair, or run first ingestion. A failure here is
    // reported but not fatal: the service comes up and answers 503 until
    // a reindex succeeds.
    if let Err(e) = engine.load_or_ingest().await {
        tracing::warn!("startup ingestion failed, serving without an index: {e}");
    }

    let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
    thesis_search::server::serve(engine, &bind).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => match Settings::init_config_file(force) {
            Ok(path) => {
                eprintln!("Created configuration at {}", path.display());
                eprintln!("Next: 'thesis-search index' to build the index");
            }
            Err(e) => {
                eprintln!("Init failed: {e}");
                ExitCode::ConfigError.exit()
            }
        },

        Commands::Index { json } => {
            run_index(load_settings(), OutputFormat::from_json_flag(json)).await;
        }

        Commands::Search { query, limit, json } => {
            run_search(
                load_settings(),
                query,
                limit,
                OutputFormat::from_json_flag(json),
            )
            .await;
        }

        Commands::Serve { bind } => {
            run_serve(load_settings(), bind).await?;
        }

        Commands::Config => {
            let settings = load_settings();
            match toml::to_string_pretty(&settings) {
                Ok(toml) => println!("{toml}"),
                Err(e) => {
                    eprintln!("Failed to render settings: {e}");
                    ExitCode::GeneralError.exit()
                }
            }
        }
    }

    Ok(())
}

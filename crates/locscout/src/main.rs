use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use locscout_common::{logger, AppConfig, LocScoutError};
use locscout_embed::OllamaEmbedder;
use locscout_vector::{load_corpus, SearchRequest, SearchService};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "locscout")]
#[command(about = "LocScout - natural-language search over geotagged street imagery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct CorpusArgs {
    /// Directory with the metadata CSV and vector files
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Run one search and print the results as JSON
    Search {
        /// Query text
        query: String,

        /// Embedding category (defaults to "full")
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of results
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum cosine similarity
        #[arg(long, allow_negative_numbers = true)]
        threshold: Option<f32>,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// List the categories found in the corpus
    Categories {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

fn load_config(corpus: &CorpusArgs) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = &corpus.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn build_embedder(config: &AppConfig) -> Result<OllamaEmbedder> {
    Ok(OllamaEmbedder::new(
        &config.embedding_base_url,
        &config.embedding_model,
        Duration::from_secs(config.embedding_timeout_secs),
    )?)
}

/// Load the corpus and wire it to the embedding client; any failure here is fatal
fn build_service(config: &AppConfig, embedder: OllamaEmbedder) -> Result<Arc<SearchService>> {
    let store = load_corpus(config).with_context(|| {
        format!("Failed to load corpus from {}", config.data_dir.display())
    })?;

    Ok(Arc::new(SearchService::new(Arc::new(store), Arc::new(embedder))))
}

async fn serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server_host = host;
    }
    if let Some(port) = port {
        config.server_port = port;
    }
    config.validate()?;

    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("LocScout starting...");
    tracing::info!("Configuration loaded:");
    tracing::info!("  Bind: {}", config.server_bind_address());
    tracing::info!("  Data: {}", config.data_dir.display());
    tracing::info!("  Embedding: {} ({})", config.embedding_model, config.embedding_base_url);

    let embedder = build_embedder(&config)?;
    let service = build_service(&config, embedder.clone())?;

    // Searches report an unreachable embedder per request, so startup goes on
    match embedder.test_connection().await {
        Ok(true) => tracing::info!("Embedding server is reachable"),
        Ok(false) => tracing::warn!(
            "Embedding server at {} answered with an error status",
            config.embedding_base_url
        ),
        Err(e) => tracing::warn!("Embedding server is unreachable: {}", e),
    }

    println!("Server listening on http://{}", config.server_bind_address());

    locscout_server::start_server(config, service).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Serve { host, port, corpus }) => {
            let config = load_config(&corpus)?;
            serve(config, host, port).await?;
        }
        Some(Commands::Search {
            query,
            category,
            top_k,
            threshold,
            corpus,
        }) => {
            let config = load_config(&corpus)?;
            logger::setup_console_logging(&config.log_level)?;

            let service = build_service(&config, build_embedder(&config)?)?;
            let mut request = SearchRequest::new(query)
                .with_top_k(top_k.unwrap_or(config.default_top_k))
                .with_threshold(threshold.unwrap_or(config.default_threshold));
            if let Some(category) = category {
                request = request.with_category(category);
            }

            let results = service.search(&request).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Some(Commands::Categories { corpus }) => {
            let config = load_config(&corpus)?;
            logger::setup_console_logging(&config.log_level)?;

            let service = build_service(&config, build_embedder(&config)?)?;
            for category in service.list_categories() {
                println!("{}", category);
            }
        }
        None => {
            let config = AppConfig::from_env().context("Failed to load configuration")?;
            serve(config, None, None).await?;
        }
    }

    Ok(())
}

/// Corpus and configuration problems exit with 2, anything else with 1
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LocScoutError>() {
        Some(e) if e.is_fatal() => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

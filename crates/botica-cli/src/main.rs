use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use botica_core::assistant::HttpAssistantClient;
use botica_core::config::BoticaConfig;
use botica_core::corpus::build_corpus;
use botica_core::export::{FileExporter, LogExporter, NoopExporter};
use botica_core::inventory;
use botica_core::rag::{
    build_from_catalog, build_from_corpus, EmbeddingGenerator, HashEmbedder, RestEmbeddingClient,
    Retriever,
};
use botica_core::session::Orchestrator;
use botica_core::sheets::HttpSheetsClient;
use botica_core::tools::default_registry;

#[derive(Parser, Debug)]
#[clap(name = "Botica", version = "0.1.0", about = "Botica retail assistant")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "botica.yaml", help = "Path to the YAML configuration file")]
    config: String,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Adapt every brand spreadsheet and write the per-brand corpus files
    BuildCorpus {
        #[clap(long, help = "Directory with the brand source tables (defaults to config)")]
        tables: Option<PathBuf>,
    },
    /// Rebuild the vector index wholesale
    BuildIndex {
        #[clap(long, help = "Build from the corpus text files instead of the catalog CSVs")]
        from_corpus: bool,
    },
    /// Pull the stock sheet into the local snapshot
    SyncStock,
    /// Recompute prices on the stock sheet with a bounded-retry write-back
    PushPrices {
        #[clap(long, help = "Factor applied to every price, e.g. 0.9")]
        multiplier: f64,
    },
    /// Interactive chat session against the hosted assistant
    Chat,
}

fn init_logging(level: &str) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn embedder(config: &BoticaConfig) -> Result<Arc<dyn EmbeddingGenerator>> {
    if config.embeddings.api_key.is_some() {
        Ok(Arc::new(RestEmbeddingClient::new(&config.embeddings)?))
    } else {
        log::warn!("No embeddings API key configured, using the offline hash embedder");
        Ok(Arc::new(HashEmbedder::new()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = BoticaConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;

    match cli.command {
        Commands::BuildCorpus { tables } => {
            let tables = tables.unwrap_or_else(|| PathBuf::from(&config.paths.tables_dir));
            let built = build_corpus(
                &tables,
                Path::new(&config.paths.corpus_dir),
                Path::new(&config.paths.catalog_dir),
            )?;
            println!("Corpus built for {} brand(s).", built);
        }
        Commands::BuildIndex { from_corpus } => {
            let embedder = embedder(&config)?;
            let index_path = PathBuf::from(&config.paths.index_path);
            let index = if from_corpus {
                build_from_corpus(Path::new(&config.paths.corpus_dir), embedder.as_ref(), &index_path)
                    .await?
            } else {
                build_from_catalog(Path::new(&config.paths.catalog_dir), embedder.as_ref(), &index_path)
                    .await?
            };
            println!("Index ready with {} documents.", index.len());
        }
        Commands::SyncStock => {
            let client = HttpSheetsClient::new(&config.inventory)?;
            let written = inventory::pull(&client, Path::new(&config.paths.stock_path)).await?;
            println!("Stock snapshot refreshed: {} products.", written);
        }
        Commands::PushPrices { multiplier } => {
            let client = HttpSheetsClient::new(&config.inventory)?;
            inventory::push(
                &client,
                multiplier,
                config.inventory.max_retries,
                Duration::from_secs(config.inventory.retry_delay_secs),
            )
            .await?;
            println!("Spreadsheet updated with multiplier {}.", multiplier);
        }
        Commands::Chat => {
            chat(&config).await?;
        }
    }
    Ok(())
}

async fn chat(config: &BoticaConfig) -> Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let api_key = config.require_api_key()?;
    let assistant_id = config.require_assistant_id()?;

    let embedder = embedder(config)?;
    let retriever = Retriever::load(Path::new(&config.paths.index_path), embedder)
        .context("loading the vector index (run build-index first)")?;
    let registry = Arc::new(default_registry(
        Arc::new(retriever),
        PathBuf::from(&config.paths.stock_path),
        &config.retrieval,
    ));

    let client = Arc::new(HttpAssistantClient::new(
        &config.assistant.api_base,
        api_key,
        assistant_id,
    ));
    let exporter: Arc<dyn LogExporter> = match Path::new(&config.paths.chat_log_path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            Arc::new(FileExporter::new(dir.to_path_buf()))
        }
        _ => Arc::new(NoopExporter),
    };
    let orchestrator = Orchestrator::new(
        client,
        registry,
        exporter,
        Duration::from_secs(config.session.idle_timeout_secs),
    );

    let mut session = orchestrator.start_session(&config.session.initial_message).await?;
    println!("{}", config.session.initial_message);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("salir") {
            break;
        }

        match orchestrator
            .user_turn(&mut session, input, |delta| {
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            })
            .await
        {
            Ok(_) => println!(),
            Err(e) => {
                println!();
                log::error!("Turn failed: {}", e);
                println!("Hubo un problema al responder, intentá de nuevo.");
            }
        }

        orchestrator.maybe_export_log(&mut session).await;
    }
    println!("Hasta luego.");
    Ok(())
}

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use corpus_indexer::CorpusIndexer;
use corpus_vector_store::{EmbeddingMode, StoreConfig};
use output::SearchOutput;
use std::path::PathBuf;

mod output;

#[derive(Parser)]
#[command(name = "corpus")]
#[command(about = "Incremental semantic search over extracted web text", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vector store directory (overrides CORPUS_STORE_DIR)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Override embedding model name
    #[arg(long, global = true)]
    embed_model: Option<String>,

    /// Model asset directory (overrides CORPUS_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the whole store from a directory of extracted text
    Embed(EmbedArgs),

    /// Re-index a single document file
    Update(UpdateArgs),

    /// Search the store
    Search(SearchArgs),

    /// Show store statistics
    Stats(StatsArgs),
}

impl Commands {
    const fn json(&self) -> bool {
        match self {
            Commands::Embed(args) => args.json,
            Commands::Update(args) => args.json,
            Commands::Search(args) => args.json,
            Commands::Stats(args) => args.json,
        }
    }
}

#[derive(Args)]
struct EmbedArgs {
    /// Directory of extracted *.txt documents
    #[arg(long, default_value = "extracted_text")]
    dir: PathBuf,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct UpdateArgs {
    /// Document file to re-index
    file: PathBuf,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(short, default_value_t = 5)]
    k: usize,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    #[value(alias = "fast")]
    Onnx,
    Stub,
}

impl EmbedMode {
    const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Onnx => EmbeddingMode::Onnx,
            EmbedMode::Stub => EmbeddingMode::Stub,
        }
    }
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON parsing
    let json_output = cli.command.json();
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // Always silence ort crate unless verbose mode (ORT is extremely noisy)
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(err) = run(cli).await {
        if json_output {
            output::print_error(&err);
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli).await?;
    log::debug!(
        "Store {} (model {}, mode {})",
        config.storage_dir.display(),
        config.model_name,
        config.embedding_mode.as_str()
    );

    match cli.command {
        Commands::Embed(args) => run_embed(args, &config).await,
        Commands::Update(args) => run_update(args, &config).await,
        Commands::Search(args) => run_search(args, &config).await,
        Commands::Stats(args) => run_stats(args, &config).await,
    }
}

/// Defaults, then `--config`, then `CORPUS_*` env, then flags.
async fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = StoreConfig::resolve(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if let Some(dir) = &cli.store_dir {
        config.storage_dir = dir.clone();
    }
    if let Some(model) = &cli.embed_model {
        config.model_name = model.clone();
    }
    if let Some(dir) = &cli.model_dir {
        config.model_dir = dir.clone();
    }
    if let Some(mode) = cli.embed_mode {
        config.embedding_mode = mode.as_domain();
    }
    Ok(config)
}

async fn run_embed(args: EmbedArgs, config: &StoreConfig) -> Result<()> {
    let mut indexer = CorpusIndexer::new(config).context("Failed to initialise embeddings")?;
    let stats = indexer
        .rebuild_from_dir(&args.dir)
        .await
        .with_context(|| format!("Failed to rebuild from {}", args.dir.display()))?;

    if args.json {
        output::print_ok(&stats)?;
    } else {
        output::render_index_stats("Indexed", &stats);
    }
    Ok(())
}

async fn run_update(args: UpdateArgs, config: &StoreConfig) -> Result<()> {
    let mut indexer = CorpusIndexer::new(config).context("Failed to initialise embeddings")?;
    let stats = indexer
        .update_file(&args.file)
        .await
        .with_context(|| format!("Failed to update {}", args.file.display()))?;

    if args.json {
        output::print_ok(&stats)?;
    } else {
        output::render_index_stats("Updated", &stats);
    }
    Ok(())
}

async fn run_search(args: SearchArgs, config: &StoreConfig) -> Result<()> {
    let mut indexer = CorpusIndexer::new(config).context("Failed to initialise embeddings")?;
    indexer.load().await.context("Failed to load vector store")?;
    let hits = indexer.search(&args.query, args.k).await?;

    let out = SearchOutput {
        query: &args.query,
        k: args.k,
        hits,
    };
    if args.json {
        output::print_ok(&out)?;
    } else {
        output::render_hits(&out);
    }
    Ok(())
}

async fn run_stats(args: StatsArgs, config: &StoreConfig) -> Result<()> {
    let mut indexer = CorpusIndexer::read_only(config)?;
    indexer.load().await.context("Failed to load vector store")?;
    let stats = indexer.stats();

    if args.json {
        output::print_ok(&stats)?;
    } else {
        output::render_store_stats(&stats);
    }
    Ok(())
}

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dnematch_api::RestApi;
use dnematch_core::{AddressQuery, Field, VectorIndex};
use dnematch_similarity::{AddressSearchEngine, EngineConfig, FieldEmbedder, SearchResult};
use dnematch_storage::{load_corpus, open_context, BuildMetadata, BuiltIndex, IndexBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Resolve Brazilian addresses against a reference catalog
#[derive(Parser, Debug)]
#[command(name = "dnematch")]
#[command(about = "Brazilian address resolver", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Engine configuration file (JSON); flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build field indices from a corpus of address records
    Build {
        /// JSON Lines or JSON array of records
        #[arg(long)]
        corpus: PathBuf,

        /// Output build directory
        #[arg(long)]
        out: PathBuf,

        /// Embedding dimension
        #[arg(long)]
        dim: Option<usize>,

        /// Texts per encoder call
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Search a build directory for one address
    Search {
        #[arg(long)]
        index: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        #[arg(long)]
        top_k: Option<usize>,

        /// Candidates requested per field index
        #[arg(long)]
        search_k: Option<usize>,

        /// Keep candidates from every state even when --uf is given
        #[arg(long)]
        no_uf_filter: bool,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Validate a build directory and print its metadata
    Inspect {
        #[arg(long)]
        index: PathBuf,
    },

    /// Serve the REST API over a build directory
    Serve {
        #[arg(long)]
        index: PathBuf,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Street name
    #[arg(long)]
    logradouro: Option<String>,

    /// Neighborhood
    #[arg(long)]
    bairro: Option<String>,

    #[arg(long)]
    cidade: Option<String>,

    /// State code, used as a filter
    #[arg(long)]
    uf: Option<String>,

    /// Postal code
    #[arg(long)]
    cep: Option<String>,
}

impl QueryArgs {
    fn into_query(self) -> AddressQuery {
        let mut query = AddressQuery::new();
        if let Some(v) = self.logradouro {
            query = query.with_logradouro(v);
        }
        if let Some(v) = self.bairro {
            query = query.with_bairro(v);
        }
        if let Some(v) = self.cidade {
            query = query.with_cidade(v);
        }
        if let Some(v) = self.uf {
            query = query.with_uf(v);
        }
        if let Some(v) = self.cep {
            query = query.with_cep(v);
        }
        query
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Load a build with an embedder matching its metadata, fully validated
fn load_engine(index: &Path, config: EngineConfig) -> anyhow::Result<AddressSearchEngine> {
    let metadata = BuildMetadata::read(index)
        .with_context(|| format!("reading build metadata in {}", index.display()))?;
    let embedder =
        FieldEmbedder::hashed(metadata.embedding_dim)?.with_batch_size(config.batch_size);
    let context = open_context(index, embedder)
        .with_context(|| format!("loading build {}", index.display()))?;
    Ok(AddressSearchEngine::new(Arc::new(context), config)?)
}

fn print_ranking(result: &SearchResult) {
    let weights: Vec<String> = result
        .weights_used
        .iter()
        .map(|(field, w)| format!("{}={:.2}", field, w))
        .collect();
    println!("weights: {}", weights.join(" "));
    println!(
        "{} result(s) from {} candidate(s)",
        result.total_found, result.candidates_considered
    );

    for (rank, ranked) in result.results.iter().enumerate() {
        println!();
        println!(
            "#{} score {:.4} [{}] (row {})",
            rank + 1,
            ranked.score,
            ranked.confidence,
            ranked.row_id
        );
        println!("   {}", ranked.address);
        for field in Field::ALL {
            if let Some(s) = ranked.field_scores.get(field) {
                println!("   {:<10} {:.4}", field.as_str(), s);
            }
        }
    }
}

fn run_build(config: &EngineConfig, corpus: &Path, out: &Path) -> anyhow::Result<()> {
    let records =
        load_corpus(corpus).with_context(|| format!("reading corpus {}", corpus.display()))?;
    let embedder =
        FieldEmbedder::hashed(config.embedding_dim)?.with_batch_size(config.batch_size);
    let built = IndexBuilder::new(embedder).build(records)?;
    let metadata = built
        .save(out)
        .with_context(|| format!("writing build to {}", out.display()))?;

    println!(
        "Built {} records ({}-d, {}) into {}",
        metadata.n_records,
        metadata.embedding_dim,
        metadata.encoder_id,
        out.display()
    );
    Ok(())
}

fn run_inspect(index: &Path) -> anyhow::Result<()> {
    let built = BuiltIndex::load(index)
        .with_context(|| format!("loading build {}", index.display()))?;
    let metadata = BuildMetadata::read(index)?;

    println!("build:        {}", index.display());
    println!("format:       v{}", metadata.format_version);
    println!("records:      {}", built.len());
    println!("embedding:    {} ({}-d)", metadata.encoder_id, metadata.embedding_dim);
    println!("created:      {}", metadata.created_at.to_rfc3339());
    for field in Field::TEXT {
        if let Some(index) = built.index(field) {
            let empty = built
                .catalog()
                .column(field)
                .filter(|v| v.trim().is_empty())
                .count();
            println!(
                "{:<13} {} vectors, {} empty",
                format!("{}:", field),
                index.len(),
                empty
            );
        }
    }
    for (name, sha) in &metadata.checksums {
        println!("sha256        {}  {}", sha, name);
    }
    Ok(())
}

async fn run_serve(engine: AddressSearchEngine, host: String, port: u16) -> anyhow::Result<()> {
    let engine = Arc::new(engine);

    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(engine, &host, port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Build {
            corpus,
            out,
            dim,
            batch_size,
        } => {
            if let Some(dim) = dim {
                config.embedding_dim = dim;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            config.validate()?;
            run_build(&config, &corpus, &out)
        }
        Command::Search {
            index,
            query,
            top_k,
            search_k,
            no_uf_filter,
            json,
        } => {
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            if let Some(search_k) = search_k {
                config.search_k = search_k;
            }
            if no_uf_filter {
                config.use_uf_filter = false;
            }
            let engine = load_engine(&index, config)?;
            let result = engine.search_default(&query.into_query())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_ranking(&result);
            }
            Ok(())
        }
        Command::Inspect { index } => run_inspect(&index),
        Command::Serve { index, host, port } => {
            info!("Starting dnematch v{}", env!("CARGO_PKG_VERSION"));
            let engine = load_engine(&index, config)?;
            info!(records = engine.context().len(), "Build loaded from {}", index.display());
            run_serve(engine, host, port).await
        }
    }
}

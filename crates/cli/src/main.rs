use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docqa_chunker::PREVIEW_CHARS;
use docqa_cli::app;
use docqa_cli::config::{DocqaConfig, EmbedMode};
use docqa_cli::report;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Chunk, embed and search a documentation directory", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./docqa.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Documents directory to index
    #[arg(long, global = true)]
    docs_dir: Option<PathBuf>,

    /// Snapshot file holding the vector index
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Embedding backend for this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, keeping a compatible snapshot unless --force
    Index(IndexArgs),

    /// Retrieve the passages most similar to a query
    Search(SearchArgs),

    /// Show snapshot metadata and whether the docs changed since the last build
    Info(InfoArgs),

    /// Show how one file is split into chunks
    Chunk(ChunkArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Rebuild even when the snapshot is compatible
    #[arg(long)]
    force: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Number of results (default from config, 5)
    #[arg(short = 'k', long = "top-k")]
    top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ChunkArgs {
    /// File to chunk
    file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    const fn json_output(&self) -> bool {
        match &self.command {
            Commands::Index(args) => args.json,
            Commands::Search(args) => args.json,
            Commands::Info(args) => args.json,
            Commands::Chunk(args) => args.json,
        }
    }

    /// Apply the flag layer on top of file and environment settings
    fn load_config(&self) -> Result<DocqaConfig> {
        let mut config = DocqaConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        if let Some(dir) = &self.docs_dir {
            config.docs_dir.clone_from(dir);
        }
        if let Some(path) = &self.snapshot {
            config.index.snapshot_path.clone_from(path);
        }
        if let Some(mode) = self.embed_mode {
            config.embedding.mode = mode;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.write_all(b"\n"))
        .and_then(|()| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    print_stdout(&serde_json::to_string_pretty(value)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    if cli.json_output() {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.load_config()?;
    log::debug!(
        "Docs {}, snapshot {}, embeddings {} ({})",
        config.docs_dir.display(),
        config.index.snapshot_path.display(),
        config.embedding.model,
        config.embedding.mode.as_str()
    );

    match cli.command {
        Commands::Index(args) => {
            let out = app::run_index(&config, args.force).await?;
            if args.json {
                print_json(&out)?;
            } else {
                print_stdout(&report::render_index(&out))?;
            }
        }
        Commands::Search(args) => {
            let k = args.top_k.unwrap_or(config.index.default_k);
            let out = app::run_search(&config, &args.query, k).await?;
            if args.json {
                print_json(&out)?;
            } else {
                print_stdout(&report::render_search(&out))?;
            }
        }
        Commands::Info(args) => {
            let out = app::run_info(&config).await?;
            if args.json {
                print_json(&out)?;
            } else {
                print_stdout(&report::render_info(&out))?;
            }
        }
        Commands::Chunk(args) => {
            let out = app::run_chunk(&config, &args.file)?;
            if args.json {
                print_json(&out)?;
            } else {
                print_stdout(&report::render_chunks(&out, PREVIEW_CHARS))?;
            }
        }
    }

    Ok(())
}

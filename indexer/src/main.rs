use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use search_core::persist::{save_all, IndexPaths, TextStore};
use search_core::build;
use tracing_subscriber::{EnvFilter, fmt};

use std::path::Path;

mod ingest;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional BM25 inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Worker threads for tokenization (0 = one per core)
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, threads } => {
            if threads > 0 {
                rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
            }
            build_index(Path::new(&input), Path::new(&output))
        }
    }
}

fn build_index(input: &Path, output: &Path) -> Result<()> {
    let ingested = ingest::load_documents(input)?;
    tracing::info!(accepted = ingested.docs.len(), skipped = ingested.skipped, "ingested documents");
    if ingested.docs.is_empty() {
        bail!("no documents found under {}", input.display());
    }

    let index = build(&ingested.docs);
    let texts: TextStore = ingested
        .docs
        .into_iter()
        .enumerate()
        .map(|(i, d)| (i as u32, d.text))
        .collect();

    let paths = IndexPaths::new(output);
    save_all(&paths, &index, &texts)?;
    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

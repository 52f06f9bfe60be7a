use anyhow::Result;
use clap::Parser;
use searcher::{SearchConfig, SearchEngine, SearchResponse};
use std::io::{BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Interactive search over a built index")]
struct Args {
    /// Index directory path
    #[arg(long, env = "SEARCH_INDEX_DIR", default_value = "./index")]
    index: String,
    /// Number of results per query
    #[arg(long, default_value_t = 5)]
    top_k: usize,
    /// Snippet radius in tokens
    #[arg(long, default_value_t = 8)]
    radius: usize,
    /// Print each response as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();
    let mut config = SearchConfig::default();
    config.snippet.radius = args.radius;
    let engine = SearchEngine::open(&args.index, config)?;

    println!("plain words   neural networks");
    println!("exact phrase  \"neural networks\"");
    println!("boolean       python AND (learning OR neural) NOT robotics");
    println!("quit          q");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("search> ");
        stdout.flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let query = line.trim();
        if matches!(query.to_lowercase().as_str(), "q" | "quit" | "exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }
        let response = engine.search(query, args.top_k);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print_response(&response);
        }
    }
    println!();
    Ok(())
}

fn print_response(response: &SearchResponse) {
    if let Some(err) = &response.error {
        println!("  syntax error: {err}");
        return;
    }
    if response.results.is_empty() {
        println!("  no results");
        return;
    }
    println!("  {} hits in {:.4}s", response.total_hits, response.took_s);
    for (rank, hit) in response.results.iter().enumerate() {
        println!("  #{}  [{:.4}]  {}", rank + 1, hit.score, hit.title);
        if !hit.url.is_empty() {
            println!("      {}", hit.url);
        }
        println!("      {}", hit.snippet);
    }
}

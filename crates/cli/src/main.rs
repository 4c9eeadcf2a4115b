use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{ProdId, ProductRecord};
use engine::{EngineConfig, ProductSummary, RatedSummary, RecommendationService, SnapshotStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// ProdRecs - Product Recommendation Engine
#[derive(Parser)]
#[command(name = "prod-recs")]
#[command(about = "Product recommendations from ratings and catalog text", long_about = None)]
struct Cli {
    /// Path to the interactions CSV
    #[arg(short, long, default_value = "data/ratings.csv")]
    data: PathBuf,

    /// Optional JSON config file; missing keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find products by name (case-insensitive substring match)
    Search {
        #[arg(long)]
        name: String,
    },

    /// Products with similar tags, category, brand and description
    Content {
        #[arg(long)]
        product_id: ProdId,

        /// Number of recommendations (default from config)
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Products rated by the same users
    Collaborative {
        #[arg(long)]
        product_id: ProdId,

        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Highest weighted rating first
    TopRated {
        #[arg(long)]
        n: Option<usize>,
    },

    /// Highest review volume first
    Popular {
        #[arg(long)]
        n: Option<usize>,
    },

    /// Dataset and snapshot counts
    Stats,

    /// Run benchmark to test query performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    // Parse and build off the async threads; this is the slow part
    info!("Loading interactions from {}", cli.data.display());
    let start = Instant::now();
    let raw = data_loader::parser::read_table(&cli.data)
        .with_context(|| format!("Failed to read {}", cli.data.display()))?;
    let store = Arc::new(SnapshotStore::new(config));
    Arc::clone(&store)
        .rebuild_in_background(raw)
        .await
        .context("Failed to build recommendation snapshot")?;
    eprintln!("{} Built snapshot in {:?}", "✓".green(), start.elapsed());

    let service = RecommendationService::new(store);
    let json = cli.json;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Search { name } => handle_search(&service, &name, json)?,
        Commands::Content { product_id, top_n } => {
            let top_n = top_n.unwrap_or(service.default_top_n());
            let rows = service.recommend_content(product_id, top_n)?;
            print_similar(&service, "Similar by content", product_id, &rows, json)?;
        }
        Commands::Collaborative { product_id, top_n } => {
            let top_n = top_n.unwrap_or(service.default_top_n());
            let rows = service.recommend_collaborative(product_id, top_n)?;
            print_similar(&service, "Rated by the same users", product_id, &rows, json)?;
        }
        Commands::TopRated { n } => {
            let rows = service.top_rated(n.unwrap_or(service.default_top_n()));
            print_rated("Top rated products", &rows, json)?;
        }
        Commands::Popular { n } => {
            let rows = service.popular(n.unwrap_or(service.default_top_n()));
            print_rated("Most reviewed products", &rows, json)?;
        }
        Commands::Stats => handle_stats(&service, json)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await?,
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(service: &RecommendationService, name: &str, json: bool) -> Result<()> {
    let candidates: Vec<ProductRecord> = service.search(name)?;
    if json {
        return print_json(&candidates);
    }

    println!("{}", format!("Products matching '{}':", name).bold().blue());
    for product in &candidates {
        println!(
            "{}: {} [{}] {}",
            product.prod_id.to_string().green(),
            product.name,
            product.category,
            product.brand.dimmed()
        );
    }
    if candidates.len() > 1 {
        println!(
            "{}",
            "Several products match; rerun with --product-id to pick one.".yellow()
        );
    }
    Ok(())
}

fn print_similar(
    service: &RecommendationService,
    title: &str,
    product_id: ProdId,
    rows: &[ProductSummary],
    json: bool,
) -> Result<()> {
    if json {
        return print_json(rows);
    }

    let snapshot = service.snapshot();
    let name = snapshot
        .catalog()
        .get(product_id)
        .map(|p| p.name.as_str())
        .unwrap_or("?");
    println!("{}", format!("{} to {} ({}):", title, name, product_id).bold().blue());
    if rows.is_empty() {
        println!("  no other products to compare against");
    }
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{}. {} {} [{}] {} - {} reviews - Score: {:.3}",
            (rank + 1).to_string().green(),
            row.prod_id,
            row.name,
            row.category,
            row.brand.dimmed(),
            row.review_count,
            row.score
        );
    }
    Ok(())
}

fn print_rated(title: &str, rows: &[RatedSummary], json: bool) -> Result<()> {
    if json {
        return print_json(rows);
    }

    println!("{}", format!("{}:", title).bold().blue());
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{}. {} {} [{}] {} - avg {:.2} over {:.0} reviews - Score: {:.3}",
            (rank + 1).to_string().green(),
            row.prod_id,
            row.name,
            row.category,
            row.brand.dimmed(),
            row.rating,
            row.review_count,
            row.score
        );
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(service: &RecommendationService, json: bool) -> Result<()> {
    let snapshot = service.snapshot();
    let stats = snapshot.stats();
    if json {
        return print_json(&stats);
    }

    let ratings = snapshot.ratings();
    println!("{}", format!("Snapshot generation {}", snapshot.generation()).bold().blue());
    println!("{}Input rows: {}", "• ".green(), stats.input_rows);
    println!("{}Rows after cleaning: {}", "• ".green(), stats.cleaned_rows);
    println!("{}Products: {}", "• ".green(), stats.products);
    println!("{}Users: {}", "• ".green(), stats.users);
    println!("{}Vocabulary terms: {}", "• ".cyan(), stats.vocabulary_size);
    println!("{}Mean rating (C): {:.3}", "• ".cyan(), ratings.global_mean());
    println!("{}Review threshold (m): {:.1}", "• ".cyan(), ratings.review_threshold());
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: RecommendationService,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let ids: Vec<ProdId> = service.snapshot().catalog().ids().collect();
    if ids.is_empty() {
        return Err(anyhow!("Catalog is empty, nothing to benchmark"));
    }
    let top_n = service.default_top_n();
    let limit = Arc::new(Semaphore::new(concurrent.max(1)));

    let started = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for i in 0..requests {
        let prod_id = ids[rand::random_range(0..ids.len())];
        let service = service.clone();
        let limit = Arc::clone(&limit);
        handles.push(tokio::spawn(async move {
            let _permit = limit.acquire_owned().await?;
            let start = Instant::now();
            let found = if i % 2 == 0 {
                service.recommend_content(prod_id, top_n).is_ok()
            } else {
                service.recommend_collaborative(prod_id, top_n).is_ok()
            };
            Ok::<_, anyhow::Error>((start.elapsed(), found))
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    let mut misses = 0usize;
    for handle in handles {
        let (elapsed, found) = handle.await??;
        timings.push(elapsed);
        if !found {
            misses += 1;
        }
    }
    let wall = started.elapsed();

    if timings.is_empty() {
        warn!("No requests were made");
        return Ok(());
    }
    timings.sort();
    let percentile = |q: f64| timings[((timings.len() - 1) as f64 * q).round() as usize];
    let total: Duration = timings.iter().sum();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent, {} not found)", requests, concurrent, misses);
    println!("Wall time: {:?}", wall);
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", requests as f64 / wall.as_secs_f64());

    Ok(())
}

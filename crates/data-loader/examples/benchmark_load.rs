use data_loader::{ProductCatalog, clean, parser::read_table};
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/ratings.csv"));

    println!("Loading interactions from {}...\n", path.display());

    let start = Instant::now();
    let raw = read_table(&path).expect("Failed to read dataset");
    let parsed = start.elapsed();

    let records = clean(&raw).expect("Failed to clean dataset");
    let catalog = ProductCatalog::from_interactions(&records);
    let elapsed = start.elapsed();

    println!("\n=== Load Complete ===");
    println!("Parse time: {:?}", parsed);
    println!("Total time: {:?}", elapsed);
    println!("Raw rows: {}", raw.len());
    println!("Clean rows: {}", records.len());
    println!("Products: {}", catalog.len());
    println!("\nPerformance: {:.0} rows/second",
             raw.len() as f64 / elapsed.as_secs_f64());
}

use data_loader::MovieLens;
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let data_dir = Path::new("ml-1m");

    println!("Loading MovieLens 1M dataset...\n");

    let start = Instant::now();
    let data = MovieLens::load_from_dir(data_dir)?;
    let elapsed = start.elapsed();

    let (movies, ratings) = data.counts();

    let split_start = Instant::now();
    let (training, test) = data.ratings.train_test_split(0.7, 42)?;
    let split_elapsed = split_start.elapsed();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!("Split in {:?}: {} training / {} test", split_elapsed, training.len(), test.len());
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());
    Ok(())
}

// Item field populator: CLI entry point.
//
// Loads a world config (or uses the built-in default), runs the Gibbs
// sampler over the configured region, prints per-type counts and sweep
// statistics, and optionally writes the resulting items as a JSON snapshot.
//
// Usage:
//   cargo run -p item_field_world --bin populate -- [config.json] [--seed N]
//     [--sweeps N] [--output items.json]
//
// Log verbosity follows RUST_LOG (e.g. `RUST_LOG=item_field_gibbs=debug` to
// see one line per sweep).

use item_field_gibbs::GibbsField;
use item_field_prng::FieldRng;
use item_field_world::{WorldConfig, WorldSnapshot};
use std::error::Error;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("populate=info,item_field_world=info")),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();

    let config_path = args.get(1).filter(|s| !s.starts_with("--"));
    let mut config = match config_path {
        Some(path) => WorldConfig::load(Path::new(path))?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = parse_flag(&args, "--seed") {
        config.seed = seed;
    }
    if let Some(sweeps) = parse_flag(&args, "--sweeps") {
        config.sweeps = sweeps;
    }
    let output: Option<String> = parse_flag(&args, "--output");
    config.validate()?;

    let patch_positions = config.region_positions();
    println!("=== Item Field Populator ===");
    println!(
        "Config: {}",
        config_path.map(String::as_str).unwrap_or("(built-in default)")
    );
    println!("Seed: {}", config.seed);
    println!(
        "Region: {} to {} ({} patches of {}x{})",
        config.region.min,
        config.region.max,
        patch_positions.len(),
        config.patch_size,
        config.patch_size
    );
    println!("Item types: {}", config.type_names().join(", "));
    println!("Sweeps: {}", config.sweeps);
    println!();

    let mut map = config.build_map()?;
    let mut rng = FieldRng::new(config.seed);
    let start = Instant::now();
    let stats = {
        let mut field = GibbsField::new(
            &mut map,
            &patch_positions,
            config.patch_size,
            config.item_type_count(),
        )?;
        info!(
            updates_per_sweep = field.updates_per_sweep(),
            "sampling started"
        );
        field.run(&mut rng, config.sweeps)?
    };
    let elapsed = start.elapsed();
    info!(elapsed_ms = elapsed.as_millis() as u64, "sampling finished");

    println!("Updates: {} in {:.2?}", stats.updates, elapsed);
    println!(
        "  unchanged {}, added {}, removed {}, replaced {}, skipped {}",
        stats.unchanged, stats.added, stats.removed, stats.replaced, stats.skipped_non_finite
    );
    println!("  change rate {:.3}", stats.change_rate());
    println!();

    let counts = map.counts_by_type(config.item_type_count());
    let cells = patch_positions.len() as f64 * f64::from(config.patch_size).powi(2);
    println!("Items placed: {}", map.item_count());
    for (item_type, count) in config.item_types.iter().zip(&counts) {
        println!(
            "  {:<12} {:>6}  ({:.2}% of cells)",
            item_type.name,
            count,
            100.0 * *count as f64 / cells
        );
    }

    if let Some(path) = output {
        let snapshot = WorldSnapshot::capture(&map, config.type_names());
        snapshot.save(Path::new(&path))?;
        println!();
        println!("Wrote {} items to {}", snapshot.items.len(), path);
    }
    Ok(())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

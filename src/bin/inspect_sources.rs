//! inspect_sources - prepare a cube source provider and print its index.
//!
//! ```text
//! inspect_sources air_temperature T2m-ECMWF/low --sources-root /data/cube-sources
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use cubesource::config::Args;
use cubesource::{create_provider, init_tracing, log_timed_operation, Config, CubeConfig, CubeSourceProvider};

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_args(&args).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    init_tracing(&config.log_level);

    info!("Starting inspect_sources v{}", env!("CARGO_PKG_VERSION"));

    let mut provider = create_provider(
        &args.provider,
        Arc::new(config.cube.clone()),
        &config.sources,
        &args.dir,
    )?;
    log_timed_operation("prepare", || provider.prepare())
        .with_context(|| format!("Failed to prepare provider '{}'", args.provider))?;

    print_summary(provider.as_ref(), args.limit);
    print_steps(provider.as_ref(), &config.cube, args.limit);
    provider.close();
    Ok(())
}

fn print_summary(provider: &dyn CubeSourceProvider, limit: usize) {
    println!("Provider: {} ({})", provider.name(), provider.state());

    println!("\nVariables:");
    for descriptor in provider.variable_descriptors() {
        println!(
            "  {} <- {} [{}] type={} fill={}",
            descriptor.canonical_name,
            descriptor.source_name,
            descriptor.units,
            descriptor.numeric_type,
            descriptor.fill_value
        );
    }

    match provider.temporal_coverage() {
        Some((start, end)) => println!("\nTemporal coverage: [{}, {})", start, end),
        None => println!("\nTemporal coverage: none"),
    }

    let ranges = provider.source_time_ranges();
    println!("\nSource time ranges: {}", ranges.len());
    for range in ranges.iter().take(limit) {
        println!(
            "  [{}, {})  band {:>3}  {}",
            range.start,
            range.end,
            range.band_index,
            range.file_path.display()
        );
    }
    if ranges.len() > limit {
        println!("  ... {} more", ranges.len() - limit);
    }
}

/// Print the cube time steps and how many index entries overlap each
fn print_steps(provider: &dyn CubeSourceProvider, cube: &CubeConfig, limit: usize) {
    let steps = cube.time_steps();
    let ranges = provider.source_time_ranges();
    let counts: Vec<usize> = steps
        .iter()
        .map(|&(t0, t1)| ranges.iter().filter(|range| range.overlaps(t0, t1)).count())
        .collect();

    println!(
        "\nCube steps of {} day(s): {} ({} with source data)",
        cube.temporal_res,
        steps.len(),
        counts.iter().filter(|&&count| count > 0).count()
    );
    for ((t0, t1), count) in steps.iter().zip(&counts).take(limit) {
        println!("  [{}, {})  {} entries", t0, t1, count);
    }
    if steps.len() > limit {
        println!("  ... {} more", steps.len() - limit);
    }
}

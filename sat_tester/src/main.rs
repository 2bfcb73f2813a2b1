mod logging;

use anyhow::Context;
use std::env;
use std::sync::Arc;
use summed_area::parallel_pipeline::WorkerPool;
use summed_area::{Region, SalienceConfig, SaliencePipeline, SeedPosition, load_grayscale, save_overlay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_subscriber();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: sat_tester <image_path> [overlay_output_path]");
        return Ok(());
    }
    let input_path = &args[1];
    let overlay_path = args.get(2);

    let config = SalienceConfig::from_env().context("reading SAT_* environment overrides")?;

    // --- 2. Image Loading ---
    // A file that cannot be decoded ends the run before anything is computed.
    let samples = load_grayscale(input_path)
        .with_context(|| format!("could not open or find the image `{input_path}`"))?;
    let (rows, cols) = samples.dimensions();
    tracing::info!(path = %input_path, rows, cols, "loaded grayscale image");

    // --- 3. Summed-Area Table ---
    let pipeline = SaliencePipeline::new(config);
    let table = pipeline.build_table(&samples)?;
    println!("{}", table.grand_total());

    // --- 4. Box Search & Overlay ---
    let Some(overlay_path) = overlay_path else {
        return Ok(());
    };

    // One search per template position, each with the preset anchored to it.
    let requests = pipeline.template_searches(rows, cols)?;
    let pool = WorkerPool::new(pipeline.config().clone());
    tracing::debug!(workers = pool.worker_count(), searches = requests.len(), "starting box search");
    let outcomes = pool.minimise_regions(Arc::new(table), &requests).await?;
    pool.shutdown().await;

    for (outcome, position) in outcomes.iter().zip(SeedPosition::ALL) {
        tracing::info!(
            seed = %position,
            region = ?outcome.region,
            cost = outcome.cost,
            moves = outcome.moves(),
            converged = outcome.converged,
            "box search finished"
        );
    }

    let regions: Vec<Region> = outcomes.iter().map(|outcome| outcome.region).collect();
    save_overlay(overlay_path, &samples, &regions)
        .with_context(|| format!("writing overlay to `{overlay_path}`"))?;
    tracing::info!(path = %overlay_path, boxes = regions.len(), "overlay written");

    Ok(())
}

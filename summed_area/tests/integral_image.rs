use std::sync::Arc;

use image::{GrayImage, Luma};
use summed_area::parallel_pipeline::WorkerPool;
use summed_area::{
    DirectionSet, Matrix, Region, SalienceConfig, SaliencePipeline, SatError, SeedPosition, SummedAreaTable, cost,
    load_grayscale, region_cost,
};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Installs a subscriber for this test thread only.
fn init_test_subscriber() -> tracing::subscriber::DefaultGuard {
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();

    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .set_default()
}

/// A 64x48 gradient with a dark square at rows 30..40, columns 8..18.
fn salience_map() -> GrayImage {
    GrayImage::from_fn(64, 48, |x, y| {
        if (30..40).contains(&y) && (8..18).contains(&x) {
            Luma([0])
        } else {
            Luma([(100 + (x + y) % 100) as u8])
        }
    })
}

#[test]
fn png_on_disk_to_grand_total() {
    let _guard = init_test_subscriber();
    let image = salience_map();
    let path = std::env::temp_dir().join("summed_area_integration_map.png");
    image.save(&path).unwrap();

    let samples = load_grayscale(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let expected: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
    let pipeline = SaliencePipeline::new(SalienceConfig::default());
    assert_eq!(pipeline.grand_total(&samples).unwrap(), expected);
}

#[test]
fn unreadable_file_stops_before_computing() {
    let path = std::env::temp_dir().join("summed_area_integration_missing.jpeg");
    assert!(matches!(load_grayscale(&path), Err(SatError::Image(_))));
}

#[test]
fn search_finds_the_dark_square() {
    let _guard = init_test_subscriber();
    let samples = Matrix::try_from(&salience_map()).unwrap();
    let config = SalienceConfig::new()
        .set_step_size(1)
        .set_iterations(500)
        .set_min_size(10, 10);
    let pipeline = SaliencePipeline::new(config);

    let start = Region::new(30, 3, 10, 10).unwrap();
    let report = pipeline.analyze(&samples, &[start]).unwrap();
    let best = report.best().unwrap();

    assert_eq!(best.region, Region::new(30, 8, 10, 10).unwrap());
    assert_eq!(best.cost, 0.0);
}

#[test]
fn origin_cost_and_box_cost_agree_on_the_origin_box() {
    let samples = Matrix::try_from(&salience_map()).unwrap();
    let sat = SummedAreaTable::build(&samples).unwrap();

    let (i, j) = (5, 7);
    let origin_box = Region::new(0, 0, i + 1, j + 1).unwrap();
    let mean = region_cost(&sat, &origin_box).unwrap();
    let density = cost(&sat, i, j).unwrap();
    let sum = sat.get(i, j).unwrap() as f64;

    assert_eq!(mean, sum / ((i + 1) * (j + 1)) as f64);
    assert_eq!(density, sum / (i * i * j * j) as f64);
    assert!(matches!(cost(&sat, 0, j), Err(SatError::DivisionByZero { .. })));
}

#[tokio::test]
async fn pool_searches_from_the_nine_templates() {
    let samples = Matrix::try_from(&salience_map()).unwrap();
    let config = SalienceConfig::new().set_workers(2).set_step_size(2).set_iterations(500);
    let pool = WorkerPool::new(config.clone());
    let pipeline = SaliencePipeline::new(config);

    let analysis = pool.process_frame(samples.clone()).await.unwrap();
    let requests = pipeline.template_searches(samples.rows(), samples.cols()).unwrap();
    assert_eq!(requests.len(), SeedPosition::ALL.len());
    assert_eq!(requests[0].direction_set, Some(DirectionSet::TopLeftAnchored));

    let outcomes = pool.minimise_regions(Arc::clone(&analysis.table), &requests).await.unwrap();
    let report = pipeline.analyze(&samples, &requests).unwrap();
    assert_eq!(outcomes, report.boxes);

    // The top-left seed may only resize, so its corner never leaves the origin.
    assert_eq!((outcomes[0].region.top, outcomes[0].region.left), (0, 0));
    pool.shutdown().await;
}

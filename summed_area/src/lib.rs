// THEORY:
// This file is the main entry point for the `summed_area` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `sat_tester` binary).
//
// The primary goal is to export the `SaliencePipeline` and its associated data
// structures (`SalienceConfig`, `SalienceReport`, etc.) as the high-level
// interface, while the building blocks in `core_modules` (the matrix, the
// summed-area table, region cost, seed placement, the box search) stay available to callers
// that want to drive them directly.

pub mod core_modules;
mod env_config;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::region_cost::{Cost, cost, region_cost, region_sum};
pub use core_modules::summed_area_table::SummedAreaTable;
pub use core_modules::utils::image_helper::image_helper::{load_grayscale, save_overlay};
pub use error::{SatError, SatResult};
pub use pipeline::{
    DescentOutcome, Direction, DirectionSet, Matrix, Region, SalienceConfig, SaliencePipeline, SalienceReport,
    Sample, SearchRequest, SeedExtent, SeedPosition, SeedRequest, Total,
};

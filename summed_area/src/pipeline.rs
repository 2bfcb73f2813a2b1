// THEORY:
// The `pipeline` module is the top-level, synchronous API for the engine. It
// encapsulates the full stack (sample matrix, summed-area table, region cost,
// box search) behind one configuration struct and one call, so a caller that
// just has pixels does not need to know how the layers fit together.
//
// Stage 1 builds the table, choosing the parallel sweep for large matrices.
// Stage 2 runs one cost descent per `SearchRequest` against that table. A
// request carries its starting box and, optionally, its own direction preset,
// step size and iteration count; anything it leaves unset comes from the
// config. A bare `Region` is a request with no overrides.
// The report carries the grand total (the table's last entry) along with every
// search outcome, which covers both the "just give me the sum" use and the box
// search.

use crate::core_modules::descent::{DescentSettings, minimise_cost};
use crate::core_modules::direction::step_as_offset;
use crate::core_modules::seed::{DEFAULT_SEED_FRACTION, validate_fraction};
use crate::core_modules::summed_area_table::SummedAreaTable;
use crate::env_config::{env_var_parse, parse_size, process_env};
use crate::error::SatResult;

// Re-export key data structures for the public API.
pub use crate::core_modules::descent::DescentOutcome;
pub use crate::core_modules::direction::{Direction, DirectionSet};
pub use crate::core_modules::matrix::matrix::{Matrix, Sample, Total};
pub use crate::core_modules::region::Region;
pub use crate::core_modules::seed::{SeedExtent, SeedPosition, SeedRequest};

const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 20;

/// Tunable behaviour of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SalienceConfig {
    /// Pixels moved per unit of a `Direction`.
    pub step_size: usize,
    /// Upper bound on descent rounds per box.
    pub iterations: usize,
    /// Smallest allowed box as `(height, width)`.
    pub min_size: (usize, usize),
    pub direction_set: DirectionSet,
    /// Matrices with at least this many samples are built with the parallel
    /// sweep. Zero disables it.
    pub parallel_threshold: usize,
    /// Worker count for the parallel pipeline.
    pub workers: usize,
    /// Share of the image area covered by each template seed.
    pub seed_fraction: f64,
}

impl Default for SalienceConfig {
    fn default() -> Self {
        let descent = DescentSettings::default();
        Self {
            step_size: descent.step_size,
            iterations: descent.iterations,
            min_size: descent.min_size,
            direction_set: DirectionSet::Unconstrained,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            workers: default_workers(),
            seed_fraction: DEFAULT_SEED_FRACTION,
        }
    }
}

impl SalienceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SAT_*` environment variables.
    pub fn from_env() -> SatResult<Self> {
        Self::default().with_overrides(process_env)
    }

    /// Applies `SAT_STEP_SIZE`, `SAT_ITERATIONS`, `SAT_MIN_SIZE`, `SAT_DIRECTIONS`,
    /// `SAT_PARALLEL_THRESHOLD`, `SAT_WORKERS` and `SAT_SEED_FRACTION` from
    /// `lookup`, then validates the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> SatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(step_size) = env_var_parse(&lookup, "SAT_STEP_SIZE")? {
            self.step_size = step_size;
        }
        if let Some(iterations) = env_var_parse(&lookup, "SAT_ITERATIONS")? {
            self.iterations = iterations;
        }
        if let Some(raw) = lookup("SAT_MIN_SIZE") {
            self.min_size = parse_size(&raw)?;
        }
        if let Some(direction_set) = env_var_parse(&lookup, "SAT_DIRECTIONS")? {
            self.direction_set = direction_set;
        }
        if let Some(threshold) = env_var_parse(&lookup, "SAT_PARALLEL_THRESHOLD")? {
            self.parallel_threshold = threshold;
        }
        if let Some(workers) = env_var_parse::<usize, _>(&lookup, "SAT_WORKERS")? {
            self.workers = workers.max(1);
        }
        if let Some(seed_fraction) = env_var_parse(&lookup, "SAT_SEED_FRACTION")? {
            self.seed_fraction = seed_fraction;
        }
        self.validate()?;
        Ok(self)
    }

    /// Rejects a step size above `isize::MAX` and a seed fraction outside (0, 1).
    /// Searches run this check too, so a bad value set through a setter is
    /// reported when it is first used.
    pub fn validate(&self) -> SatResult<()> {
        step_as_offset(self.step_size)?;
        validate_fraction(self.seed_fraction)
    }

    pub fn set_step_size(mut self, step_size: usize) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn set_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn set_min_size(mut self, height: usize, width: usize) -> Self {
        self.min_size = (height, width);
        self
    }

    pub fn set_direction_set(mut self, direction_set: DirectionSet) -> Self {
        self.direction_set = direction_set;
        self
    }

    pub fn set_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn set_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn set_seed_fraction(mut self, seed_fraction: f64) -> Self {
        self.seed_fraction = seed_fraction;
        self
    }
}

/// One box search: where it starts and, optionally, how it moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub start: Region,
    /// Falls back to `SalienceConfig::direction_set`.
    pub direction_set: Option<DirectionSet>,
    /// Falls back to `SalienceConfig::step_size`.
    pub step_size: Option<usize>,
    /// Falls back to `SalienceConfig::iterations`.
    pub iterations: Option<usize>,
}

impl SearchRequest {
    pub fn new(start: Region) -> Self {
        Self {
            start,
            direction_set: None,
            step_size: None,
            iterations: None,
        }
    }

    pub fn set_direction_set(mut self, direction_set: DirectionSet) -> Self {
        self.direction_set = Some(direction_set);
        self
    }

    pub fn set_step_size(mut self, step_size: usize) -> Self {
        self.step_size = Some(step_size);
        self
    }

    pub fn set_iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }
}

impl From<Region> for SearchRequest {
    fn from(start: Region) -> Self {
        Self::new(start)
    }
}

/// One core is left free, and there is always at least one worker.
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// The output of one `analyze` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SalienceReport {
    pub rows: usize,
    pub cols: usize,
    /// Sum of every sample.
    pub grand_total: Total,
    /// One outcome per starting box, in the order the boxes were given.
    pub boxes: Vec<DescentOutcome>,
}

impl SalienceReport {
    /// The lowest-cost outcome, if any boxes were searched.
    pub fn best(&self) -> Option<&DescentOutcome> {
        self.boxes.iter().min_by(|a, b| a.cost.total_cmp(&b.cost))
    }
}

/// The main, top-level struct for the engine.
#[derive(Debug, Clone)]
pub struct SaliencePipeline {
    config: SalienceConfig,
}

impl SaliencePipeline {
    pub fn new(config: SalienceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SalienceConfig {
        &self.config
    }

    /// Stage 1: the summed-area table, sequential or parallel depending on size.
    pub fn build_table<T: Sample>(&self, samples: &Matrix<T>) -> SatResult<SummedAreaTable> {
        let threshold = self.config.parallel_threshold;
        if threshold > 0 && samples.len() >= threshold {
            SummedAreaTable::build_parallel(samples)
        } else {
            SummedAreaTable::build(samples)
        }
    }

    pub fn grand_total<T: Sample>(&self, samples: &Matrix<T>) -> SatResult<Total> {
        Ok(self.build_table(samples)?.grand_total())
    }

    /// Stage 2 for a single search against an existing table.
    pub fn minimise(&self, sat: &SummedAreaTable, request: impl Into<SearchRequest>) -> SatResult<DescentOutcome> {
        let request = request.into();
        let config = &self.config;
        config.validate()?;
        let settings = DescentSettings {
            step_size: request.step_size.unwrap_or(config.step_size),
            iterations: request.iterations.unwrap_or(config.iterations),
            min_size: config.min_size,
        };
        let direction_set = request.direction_set.unwrap_or(config.direction_set);
        minimise_cost(sat, request.start, &settings, direction_set.directions())
    }

    /// The nine template searches for a `rows x cols` image: every
    /// `SeedPosition` at `seed_fraction` of the image, each moving with the
    /// preset anchored to its position.
    pub fn template_searches(&self, rows: usize, cols: usize) -> SatResult<Vec<SearchRequest>> {
        self.config.validate()?;
        SeedRequest::templates(self.config.seed_fraction)
            .into_iter()
            .map(|seed| -> SatResult<SearchRequest> {
                let start = seed.region(rows, cols)?;
                Ok(SearchRequest::new(start).set_direction_set(seed.position.anchored_directions()))
            })
            .collect()
    }

    /// Builds the table and runs every search in `requests`.
    pub fn analyze<T, R>(&self, samples: &Matrix<T>, requests: &[R]) -> SatResult<SalienceReport>
    where
        T: Sample,
        R: Into<SearchRequest> + Copy,
    {
        let sat = self.build_table(samples)?;
        let boxes = requests
            .iter()
            .map(|&request| self.minimise(&sat, request))
            .collect::<SatResult<Vec<_>>>()?;

        tracing::info!(
            rows = sat.rows(),
            cols = sat.cols(),
            grand_total = sat.grand_total(),
            boxes = boxes.len(),
            "analysis complete"
        );

        Ok(SalienceReport {
            rows: sat.rows(),
            cols: sat.cols(),
            grand_total: sat.grand_total(),
            boxes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::region_cost::region_cost;
    use crate::error::SatError;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| pairs.iter().find(|(key, _)| *key == name).map(|(_, value)| value.to_string())
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = SalienceConfig::new()
            .with_overrides(lookup(&[
                ("SAT_STEP_SIZE", "50"),
                ("SAT_ITERATIONS", "70"),
                ("SAT_MIN_SIZE", "25"),
                ("SAT_DIRECTIONS", "top-left-anchored"),
                ("SAT_WORKERS", "0"),
            ]))
            .unwrap();
        assert_eq!(config.step_size, 50);
        assert_eq!(config.iterations, 70);
        assert_eq!(config.min_size, (25, 25));
        assert_eq!(config.direction_set, DirectionSet::TopLeftAnchored);
        assert_eq!(config.workers, 1);
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
    }

    #[test]
    fn bad_override_is_reported() {
        let result = SalienceConfig::new().with_overrides(lookup(&[("SAT_DIRECTIONS", "sideways")]));
        assert!(matches!(result, Err(SatError::InvalidConfig(_))));
    }

    #[test]
    fn grand_total_of_the_worked_example() {
        let samples = Matrix::from_rows(&[[1u8, 2, 3], [4, 5, 6], [7, 8, 9]]).unwrap();
        let pipeline = SaliencePipeline::new(SalienceConfig::default());
        assert_eq!(pipeline.grand_total(&samples).unwrap(), 45);
    }

    #[test]
    fn threshold_selects_the_parallel_sweep_with_the_same_result() {
        let data: Vec<u16> = (0..64 * 64).map(|v| (v % 1000) as u16).collect();
        let samples = Matrix::new(64, 64, data).unwrap();
        let sequential = SaliencePipeline::new(SalienceConfig::new().set_parallel_threshold(0));
        let parallel = SaliencePipeline::new(SalienceConfig::new().set_parallel_threshold(1));
        assert_eq!(
            sequential.build_table(&samples).unwrap(),
            parallel.build_table(&samples).unwrap()
        );
    }

    fn dark_square_at(top: usize, left: usize) -> Matrix<u8> {
        let mut data = vec![255u8; 32 * 32];
        for i in top..top + 8 {
            for j in left..left + 8 {
                data[i * 32 + j] = 0;
            }
        }
        Matrix::new(32, 32, data).unwrap()
    }

    #[test]
    fn analyze_reports_every_box_in_order() {
        let samples = dark_square_at(20, 4);
        let pipeline = SaliencePipeline::new(SalienceConfig::new().set_step_size(1).set_min_size(4, 4));
        let starts = [
            Region::new(0, 0, 8, 8).unwrap(),
            Region::new(20, 4, 8, 8).unwrap(),
            Region::new(24, 24, 8, 8).unwrap(),
        ];
        let report = pipeline.analyze(&samples, &starts).unwrap();

        assert_eq!((report.rows, report.cols), (32, 32));
        assert_eq!(report.grand_total, 255 * (32 * 32 - 64));
        assert_eq!(report.boxes.len(), 3);
        for (outcome, start) in report.boxes.iter().zip(&starts) {
            assert_eq!(outcome.history[0], *start);
        }
        let best = report.best().unwrap();
        assert_eq!(best.cost, 0.0);
    }

    #[test]
    fn each_request_moves_with_its_own_settings() {
        let samples = dark_square_at(12, 12);
        let sat = SummedAreaTable::build(&samples).unwrap();
        let pipeline = SaliencePipeline::new(SalienceConfig::new().set_step_size(1).set_iterations(200));
        let start = Region::new(8, 8, 16, 16).unwrap();

        let requests = [
            SearchRequest::new(start),
            SearchRequest::new(start).set_direction_set(DirectionSet::TopLeftAnchored),
            SearchRequest::new(start).set_direction_set(DirectionSet::BottomRightAnchored),
            SearchRequest::new(start).set_iterations(0),
            SearchRequest::new(start)
                .set_direction_set(DirectionSet::TopLeftAnchored)
                .set_step_size(4),
        ];
        let outcomes: Vec<DescentOutcome> = requests
            .iter()
            .map(|&request| pipeline.minimise(&sat, request).unwrap())
            .collect();

        for outcome in &outcomes[1..3] {
            assert!(outcome.cost < region_cost(&sat, &start).unwrap());
        }
        // Anchored presets keep their corner.
        assert_eq!((outcomes[1].region.top, outcomes[1].region.left), (8, 8));
        assert_eq!(outcomes[2].region.bottom_right(), start.bottom_right());
        assert_eq!(outcomes[3].region, start);
        // Coarser steps only land on multiples of the step.
        assert_eq!(outcomes[4].region.height % 4, 0);
        assert_eq!(outcomes[4].region.width % 4, 0);

        let report = pipeline.analyze(&samples, &requests).unwrap();
        assert_eq!(report.boxes, outcomes);
    }

    #[test]
    fn template_searches_pair_positions_with_anchors() {
        let pipeline = SaliencePipeline::new(SalienceConfig::default());
        let requests = pipeline.template_searches(48, 64).unwrap();
        assert_eq!(requests.len(), 9);
        for (request, position) in requests.iter().zip(SeedPosition::ALL) {
            assert_eq!(request.direction_set, Some(position.anchored_directions()));
            assert!(request.start.fits(48, 64));
        }
        assert_eq!(requests[0].start, Region::new(0, 0, 21, 28).unwrap());
        assert_eq!(requests[3].start, Region::new(27, 36, 21, 28).unwrap());
        assert_eq!(requests[4].start, Region::new(14, 18, 21, 28).unwrap());
    }

    #[test]
    fn oversized_step_is_rejected_when_configured_or_used() {
        let result = SalienceConfig::new().with_overrides(lookup(&[("SAT_STEP_SIZE", "18446744073709551615")]));
        assert!(matches!(result, Err(SatError::InvalidConfig(_))));

        let pipeline = SaliencePipeline::new(SalienceConfig::new().set_step_size(usize::MAX));
        let sat = SummedAreaTable::build(&dark_square_at(0, 0)).unwrap();
        let start = Region::new(0, 0, 4, 4).unwrap();
        assert!(matches!(pipeline.minimise(&sat, start), Err(SatError::InvalidConfig(_))));

        let request = SearchRequest::new(start).set_step_size(1 << 63);
        let pipeline = SaliencePipeline::new(SalienceConfig::default());
        assert!(matches!(pipeline.minimise(&sat, request), Err(SatError::InvalidConfig(_))));
    }

    #[test]
    fn seed_fraction_is_validated() {
        let result = SalienceConfig::new().with_overrides(lookup(&[("SAT_SEED_FRACTION", "1.2")]));
        assert!(matches!(result, Err(SatError::InvalidConfig(_))));
        let config = SalienceConfig::new()
            .with_overrides(lookup(&[("SAT_SEED_FRACTION", "0.3")]))
            .unwrap();
        assert_eq!(config.seed_fraction, 0.3);
    }
}

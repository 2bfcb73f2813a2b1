// THEORY:
// The `descent` module is the search layer. Given a finished `SummedAreaTable`
// and a starting `Region`, it walks the box toward lower cost (lower mean sample
// value) by greedy local search:
//
// 1.  **Candidates**: each iteration starts from the current box and builds one
//     candidate per `Direction`, translating the anchor and then resizing, both
//     scaled by the step size. A candidate that leaves the table, goes negative
//     or drops below the minimum size is skipped.
// 2.  **Selection**: every candidate is scored with `region_cost`, which is O(1)
//     thanks to the table. The lowest score wins; on a tie the earlier entry
//     wins, and the current box is always first, so the box only moves on a
//     strict improvement.
// 3.  **Termination**: after `iterations` rounds, or as soon as a round finds no
//     improving candidate. At that point every further round would pick the
//     current box again, so stopping early returns the same result.
//
// The search is stateless apart from the box it is carrying, and never
// increases the cost.

use crate::core_modules::direction::{Direction, step_as_offset};
use crate::core_modules::region::Region;
use crate::core_modules::region_cost::{Cost, region_cost};
use crate::core_modules::summed_area_table::SummedAreaTable;
use crate::error::SatResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescentSettings {
    /// Pixels per unit of a `Direction`.
    pub step_size: usize,
    /// Upper bound on search rounds.
    pub iterations: usize,
    /// Smallest allowed `(height, width)`.
    pub min_size: (usize, usize),
}

impl Default for DescentSettings {
    fn default() -> Self {
        Self {
            step_size: 10,
            iterations: 10_000,
            min_size: (1, 1),
        }
    }
}

impl DescentSettings {
    /// Rejects a step size that cannot be expressed as a signed move.
    pub fn validate(&self) -> SatResult<()> {
        step_as_offset(self.step_size).map(|_| ())
    }
}

/// Where a search ended up and how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct DescentOutcome {
    pub region: Region,
    pub cost: Cost,
    /// Every accepted box, starting box first.
    pub history: Vec<Region>,
    /// True when the search stopped because no move improved the cost.
    pub converged: bool,
}

impl DescentOutcome {
    pub fn moves(&self) -> usize {
        self.history.len() - 1
    }
}

/// Greedily moves `start` toward the lowest-cost box reachable with `directions`.
pub fn minimise_cost(
    sat: &SummedAreaTable,
    start: Region,
    settings: &DescentSettings,
    directions: &[Direction],
) -> SatResult<DescentOutcome> {
    settings.validate()?;
    let (rows, cols) = sat.dimensions();
    start.validate(settings.min_size, rows, cols)?;

    let mut current = start;
    let mut current_cost = region_cost(sat, &current)?;
    let mut history = vec![current];
    let mut converged = false;

    for _ in 0..settings.iterations {
        let mut best: Option<(Region, Cost)> = None;

        for direction in directions {
            let candidate = direction
                .scaled(settings.step_size)
                .and_then(|step| apply(&current, &step, settings.min_size, rows, cols));
            let candidate = match candidate {
                Ok(candidate) => candidate,
                Err(err) => {
                    tracing::trace!(?direction, %err, "skipping candidate");
                    continue;
                }
            };
            let candidate_cost = region_cost(sat, &candidate)?;
            let to_beat = best.map_or(current_cost, |(_, cost)| cost);
            if candidate_cost < to_beat {
                best = Some((candidate, candidate_cost));
            }
        }

        match best {
            Some((region, cost)) => {
                current = region;
                current_cost = cost;
                history.push(region);
            }
            None => {
                converged = true;
                break;
            }
        }
    }

    tracing::debug!(
        ?start,
        end = ?current,
        cost = current_cost,
        moves = history.len() - 1,
        converged,
        "descent finished"
    );

    Ok(DescentOutcome {
        region: current,
        cost: current_cost,
        history,
        converged,
    })
}

fn apply(
    region: &Region,
    step: &Direction,
    min_size: (usize, usize),
    rows: usize,
    cols: usize,
) -> SatResult<Region> {
    let moved = region.translate(step.translate)?.resize(step.resize)?;
    moved.validate(min_size, rows, cols)?;
    Ok(moved)
}

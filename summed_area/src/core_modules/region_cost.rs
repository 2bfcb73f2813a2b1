// THEORY:
// The `region_cost` module answers aggregate questions about a finished
// `SummedAreaTable` in constant time. It never touches the samples again.
//
// Two metrics live here:
// 1.  **Origin cost** (`cost`): `SAT(i, j) / (i^2 * j^2)`, a normalized density
//     of the origin-anchored rectangle ending at (i, j). Row 0 and column 0 have
//     no defined value and fail with `DivisionByZero`.
// 2.  **Box cost** (`region_cost`): the mean sample inside an arbitrary `Region`,
//     `region_sum / area`. The sum comes from the standard inclusion-exclusion of
//     four table entries,
//         sum = SAT(b, r) - SAT(t - 1, r) - SAT(b, l - 1) + SAT(t - 1, l - 1)
//     where an entry on row -1 or column -1 reads as zero.
//
// Both are pure functions of the table and their arguments.

use crate::core_modules::matrix::matrix::{Index, Total};
use crate::core_modules::region::Region;
use crate::core_modules::summed_area_table::SummedAreaTable;
use crate::error::{SatError, SatResult};

pub type Cost = f64;

/// `SAT(i, j) / (i^2 * j^2)`, evaluated in floating point.
///
/// The quotient is not truncated: `cost(sat, 2, 2)` over a table whose entry
/// is 45 is `2.8125`, where an integer division would give `2`.
pub fn cost(sat: &SummedAreaTable, i: Index, j: Index) -> SatResult<Cost> {
    if i == 0 || j == 0 {
        return Err(SatError::DivisionByZero { i, j });
    }
    let total = sat.get(i, j)?;
    let (i, j) = (i as f64, j as f64);
    Ok(total as f64 / (i * i * j * j))
}

/// Sum of the samples inside `region`.
pub fn region_sum(sat: &SummedAreaTable, region: &Region) -> SatResult<Total> {
    let (rows, cols) = sat.dimensions();
    if !region.fits(rows, cols) {
        return Err(SatError::OutOfBounds {
            i: region.top.saturating_add(region.height - 1),
            j: region.left.saturating_add(region.width - 1),
            rows,
            cols,
        });
    }
    let bottom = region.top + region.height - 1;
    let right = region.left + region.width - 1;

    let whole = sat.get(bottom, right)?;
    let above = if region.top > 0 { sat.get(region.top - 1, right)? } else { 0 };
    let beside = if region.left > 0 { sat.get(bottom, region.left - 1)? } else { 0 };
    let corner = if region.top > 0 && region.left > 0 {
        sat.get(region.top - 1, region.left - 1)?
    } else {
        0
    };

    // The result is a sum of samples so it fits in `Total`; only the
    // intermediate steps can wrap.
    Ok(whole.wrapping_sub(above).wrapping_sub(beside).wrapping_add(corner))
}

/// Mean sample value inside `region`.
pub fn region_cost(sat: &SummedAreaTable, region: &Region) -> SatResult<Cost> {
    let sum = region_sum(sat, region)?;
    Ok(sum as f64 / region.area() as f64)
}

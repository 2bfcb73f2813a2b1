// THEORY:
// The `SummedAreaTable` is the acceleration structure at the centre of the engine.
// Entry (i, j) holds the sum of every sample in the rectangle from (0, 0) to
// (i, j) inclusive, which turns any rectangular aggregate query into at most
// four lookups.
//
// Construction is a single sequential sweep:
// 1.  **Row zero**: a running prefix sum, `SAT(0, j) = SAT(0, j - 1) + S(0, j)`.
// 2.  **Every later row**: a row accumulator is reset to zero, each sample is
//     added to it, and the cell becomes `SAT(i - 1, j) + row_sum`. This never
//     needs `SAT(i, j - 1)` and `SAT(i - 1, j - 1)` at the same time, and is
//     equivalent to the four-term closed form.
//
// Row i depends on the finished row i - 1, and each column depends on the one
// to its left, so the sweep has a strict order. `build_parallel` breaks that
// chain the other way round: all row-prefix sums are independent and run in
// parallel, then each row adds the row above it with columns split into bands.
// Both builders produce identical tables.
//
// Accumulation is always `Total` (u64) with checked adds. For 8, 16 and 32 bit
// samples that width cannot be exhausted by any matrix that fits in memory;
// 64-bit samples can, and report `Overflow` rather than wrapping.

use crate::core_modules::matrix::matrix::{Index, Matrix, Sample, Total};
use crate::error::{SatError, SatResult};
use rayon::prelude::*;

const MIN_COLUMN_BAND: usize = 256;

/// A read-only cumulative-sum matrix with the same extent as its source samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummedAreaTable {
    table: Matrix<Total>,
}

impl SummedAreaTable {
    /// Builds the table for `samples` with the sequential row-accumulator sweep.
    pub fn build<T: Sample>(samples: &Matrix<T>) -> SatResult<Self> {
        let (rows, cols) = samples.dimensions();
        let sums = sweep(samples.as_slice(), rows, cols)?;
        Self::from_sums(rows, cols, sums)
    }

    /// Builds the table straight from a flat row-major buffer.
    pub fn from_samples<T: Sample>(samples: &[T], rows: usize, cols: usize) -> SatResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(SatError::InvalidDimensions { rows, cols });
        }
        let expected = rows
            .checked_mul(cols)
            .ok_or(SatError::InvalidDimensions { rows, cols })?;
        if samples.len() != expected {
            return Err(SatError::LengthMismatch {
                expected,
                actual: samples.len(),
            });
        }
        let sums = sweep(samples, rows, cols)?;
        Self::from_sums(rows, cols, sums)
    }

    /// Builds the same table as [`SummedAreaTable::build`] using two rayon sweeps.
    pub fn build_parallel<T: Sample>(samples: &Matrix<T>) -> SatResult<Self> {
        let (rows, cols) = samples.dimensions();
        let mut table = Matrix::new(rows, cols, vec![0 as Total; samples.len()])?;
        let sums = table.as_mut_slice();

        // Sweep 1: row-prefix sums, rows are independent.
        sums.par_chunks_mut(cols)
            .zip(samples.as_slice().par_chunks(cols))
            .enumerate()
            .try_for_each(|(i, (out, input))| -> SatResult<()> {
                let mut row_sum: Total = 0;
                for (j, (cell, &sample)) in out.iter_mut().zip(input).enumerate() {
                    row_sum = accumulate(row_sum, sample.into(), i, j)?;
                    *cell = row_sum;
                }
                Ok(())
            })?;

        // Sweep 2: fold in the finished row above, columns in parallel bands.
        let band = (cols / rayon::current_num_threads().max(1)).max(MIN_COLUMN_BAND);
        for i in 1..rows {
            let (done, rest) = sums.split_at_mut(i * cols);
            let above = &done[(i - 1) * cols..];
            rest[..cols]
                .par_chunks_mut(band)
                .zip(above.par_chunks(band))
                .enumerate()
                .try_for_each(|(b, (current, above))| -> SatResult<()> {
                    for (offset, (cell, &prev)) in current.iter_mut().zip(above).enumerate() {
                        *cell = accumulate(*cell, prev, i, b * band + offset)?;
                    }
                    Ok(())
                })?;
        }

        tracing::debug!(
            rows,
            cols,
            total = table.as_slice()[table.len() - 1],
            "built summed-area table in parallel"
        );
        Ok(Self { table })
    }

    fn from_sums(rows: usize, cols: usize, sums: Vec<Total>) -> SatResult<Self> {
        let table = Matrix::new(rows, cols, sums)?;
        tracing::debug!(rows, cols, total = table.as_slice()[table.len() - 1], "built summed-area table");
        Ok(Self { table })
    }

    /// Sum of the rectangle (0, 0)..=(i, j).
    pub fn get(&self, i: Index, j: Index) -> SatResult<Total> {
        self.table.get(i, j)
    }

    /// Sum of every sample: the bottom-right entry.
    pub fn grand_total(&self) -> Total {
        self.table.as_slice()[self.table.len() - 1]
    }

    pub fn rows(&self) -> usize {
        self.table.rows()
    }

    pub fn cols(&self) -> usize {
        self.table.cols()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.table.dimensions()
    }

    pub fn as_slice(&self) -> &[Total] {
        self.table.as_slice()
    }
}

/// The sequential sweep over a row-major buffer already known to be `rows * cols` long.
fn sweep<T: Sample>(input: &[T], rows: usize, cols: usize) -> SatResult<Vec<Total>> {
    let mut sums: Vec<Total> = vec![0; rows * cols];

    // Row zero is done separately so nothing reads row -1.
    sums[0] = input[0].into();
    for j in 1..cols {
        sums[j] = accumulate(sums[j - 1], input[j].into(), 0, j)?;
    }

    for i in 1..rows {
        let (done, rest) = sums.split_at_mut(i * cols);
        let above = &done[(i - 1) * cols..];
        let current = &mut rest[..cols];
        let samples = &input[i * cols..(i + 1) * cols];

        let mut row_sum: Total = 0;
        for (j, ((cell, &prev), &sample)) in current.iter_mut().zip(above).zip(samples).enumerate() {
            row_sum = accumulate(row_sum, sample.into(), i, j)?;
            *cell = accumulate(prev, row_sum, i, j)?;
        }
    }

    Ok(sums)
}

#[inline]
fn accumulate(total: Total, value: Total, i: usize, j: usize) -> SatResult<Total> {
    total.checked_add(value).ok_or(SatError::Overflow { i, j })
}

// THEORY:
// The `Matrix` module is the most fundamental unit of the engine. It is a "dumb"
// data container for a rectangular grid of values stored row-major in a single
// flat `Vec`, so that coordinate (i, j) lives at `i * cols + j`. It is used for
// both sides of the summed-area computation:
//
// - the sample matrix, whose element type varies (8-bit grayscale from an image
//   decoder, or wider pre-summed integers from a caller), and
// - the cumulative-sum matrix, whose element type is always `Total`.
//
// Key principles:
// 1) A matrix is never empty. `new` rejects a zero extent and a buffer of the
//    wrong length, so every other component can index without re-checking shape.
// 2) The container owns its buffer. Dropping it releases the memory; there is
//    no manual release step to forget on an early return.
// 3) Any unsigned integer sample type that widens losslessly into `Total` is a
//    valid `Sample`. The accumulator width is fixed; the input width is not.

pub mod matrix {
    use crate::error::{SatError, SatResult};
    use image::{ImageBuffer, Luma, Primitive};

    /// The accumulation type of every summed-area table.
    pub type Total = u64;
    pub type Index = usize;

    /// An input element the builder can accumulate.
    ///
    /// Implemented for every type that converts into `Total` without loss
    /// (`u8`, `u16`, `u32`, `u64`).
    pub trait Sample: Copy + Into<Total> + Send + Sync {}

    impl<T> Sample for T where T: Copy + Into<Total> + Send + Sync {}

    /// A non-empty, row-major grid of values.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Matrix<T> {
        rows: usize,
        cols: usize,
        data: Vec<T>,
    }

    impl<T> Matrix<T> {
        pub fn new(rows: usize, cols: usize, data: Vec<T>) -> SatResult<Self> {
            if rows == 0 || cols == 0 {
                return Err(SatError::InvalidDimensions { rows, cols });
            }
            let expected = rows
                .checked_mul(cols)
                .ok_or(SatError::InvalidDimensions { rows, cols })?;
            if data.len() != expected {
                return Err(SatError::LengthMismatch {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self { rows, cols, data })
        }

        pub fn rows(&self) -> usize {
            self.rows
        }

        pub fn cols(&self) -> usize {
            self.cols
        }

        /// `(rows, cols)`.
        pub fn dimensions(&self) -> (usize, usize) {
            (self.rows, self.cols)
        }

        pub fn len(&self) -> usize {
            self.data.len()
        }

        /// Always false; kept for parity with `len`.
        pub fn is_empty(&self) -> bool {
            self.data.is_empty()
        }

        pub fn as_slice(&self) -> &[T] {
            &self.data
        }

        pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
            &mut self.data
        }

        /// Row-major linear index of (i, j).
        pub fn index_of(&self, i: Index, j: Index) -> SatResult<usize> {
            if i >= self.rows || j >= self.cols {
                return Err(SatError::OutOfBounds {
                    i,
                    j,
                    rows: self.rows,
                    cols: self.cols,
                });
            }
            Ok(i * self.cols + j)
        }
    }

    impl<T: Copy> Matrix<T> {
        pub fn get(&self, i: Index, j: Index) -> SatResult<T> {
            let index = self.index_of(i, j)?;
            Ok(self.data[index])
        }

        /// Builds a matrix from nested rows. Every row must have the same length.
        pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> SatResult<Self> {
            let cols = rows.first().map_or(0, |row| row.as_ref().len());
            let mut data = Vec::with_capacity(rows.len() * cols);
            for row in rows {
                let row = row.as_ref();
                if row.len() != cols {
                    return Err(SatError::LengthMismatch {
                        expected: cols,
                        actual: row.len(),
                    });
                }
                data.extend_from_slice(row);
            }
            Self::new(rows.len(), cols, data)
        }
    }

    impl<P: Primitive + 'static> TryFrom<&ImageBuffer<Luma<P>, Vec<P>>> for Matrix<P> {
        type Error = SatError;

        /// Rows follow the image height, columns follow its width.
        fn try_from(image: &ImageBuffer<Luma<P>, Vec<P>>) -> SatResult<Self> {
            let (width, height) = image.dimensions();
            Self::new(height as usize, width as usize, image.as_raw().clone())
        }
    }
}

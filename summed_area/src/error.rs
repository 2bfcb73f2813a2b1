// THEORY:
// Every failure in the engine is local and synchronous: a bad extent handed to
// the builder, a zero coordinate handed to the cost evaluator, a box that walks
// off the edge of the table. None of them are worth retrying, since the
// computation is deterministic, so they are all surfaced as one enum at the
// point of the call and the caller decides what to do.

use std::fmt;

#[derive(Debug)]
pub enum SatError {
    /// A matrix was described with zero rows or zero columns.
    InvalidDimensions { rows: usize, cols: usize },

    /// A flat sample buffer does not hold exactly `rows * cols` elements.
    LengthMismatch { expected: usize, actual: usize },

    /// The origin-anchored cost was asked for on row 0 or column 0.
    DivisionByZero { i: usize, j: usize },

    /// A coordinate lies outside the table.
    OutOfBounds {
        i: usize,
        j: usize,
        rows: usize,
        cols: usize,
    },

    InvalidRegion(String),

    /// The running total at (i, j) no longer fits in the accumulator.
    Overflow { i: usize, j: usize },

    InvalidConfig(String),

    /// A worker task went away before answering.
    WorkerUnavailable,

    Image(image::ImageError),

    Io(std::io::Error),
}

impl fmt::Display for SatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { rows, cols } => {
                write!(f, "matrix must have at least one row and one column, got {rows}x{cols}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "sample buffer holds {actual} elements, expected {expected}")
            }
            Self::DivisionByZero { i, j } => {
                write!(f, "cost is undefined on row or column zero (i={i}, j={j})")
            }
            Self::OutOfBounds { i, j, rows, cols } => {
                write!(f, "coordinate ({i}, {j}) is outside a {rows}x{cols} table")
            }
            Self::InvalidRegion(message) => write!(f, "invalid region: {message}"),
            Self::Overflow { i, j } => write!(f, "cumulative sum overflowed at ({i}, {j})"),
            Self::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
            Self::WorkerUnavailable => write!(f, "worker pool task is not running"),
            Self::Image(err) => write!(f, "image error: {err}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}

impl std::error::Error for SatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<image::ImageError> for SatError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

impl From<std::io::Error> for SatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type SatResult<T> = Result<T, SatError>;

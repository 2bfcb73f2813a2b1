// THEORY:
// A `Region` is an axis-aligned box over the sample grid, anchored at its top-left
// cell and described by its extent. Indices follow the matrix (i, j) convention
// throughout: `top` and `height` run down the rows, `left` and `width` run across
// the columns.
//
// Regions are plain values. Moving or resizing one produces a new region, and
// every constructor that could produce a degenerate box (negative anchor, empty
// extent, smaller than the requested minimum, hanging past the table) returns
// `InvalidRegion` instead. The search layer relies on that: a candidate move that
// fails is simply not a candidate.

use crate::error::{SatError, SatResult};

/// A move in (i, j) order.
pub type Offset = (isize, isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub top: usize,
    pub left: usize,
    pub height: usize,
    pub width: usize,
}

impl Region {
    pub fn new(top: usize, left: usize, height: usize, width: usize) -> SatResult<Self> {
        if height == 0 || width == 0 {
            return Err(SatError::InvalidRegion(format!(
                "extent must be at least 1x1, got {height}x{width}"
            )));
        }
        Ok(Self {
            top,
            left,
            height,
            width,
        })
    }

    /// The cell just past the box, `(top + height, left + width)`, saturating at
    /// `usize::MAX`.
    pub fn bottom_right(&self) -> (usize, usize) {
        (
            self.top.saturating_add(self.height),
            self.left.saturating_add(self.width),
        )
    }

    /// True when the whole box lies inside a `rows x cols` table.
    pub fn fits(&self, rows: usize, cols: usize) -> bool {
        self.top < rows && self.height <= rows - self.top && self.left < cols && self.width <= cols - self.left
    }

    pub fn area(&self) -> usize {
        self.height * self.width
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i >= self.top && i - self.top < self.height && j >= self.left && j - self.left < self.width
    }

    /// Checks the box against a minimum `(height, width)` and a `rows x cols` table.
    pub fn validate(&self, min_size: (usize, usize), rows: usize, cols: usize) -> SatResult<()> {
        if self.height < min_size.0 {
            return Err(SatError::InvalidRegion(format!(
                "height {} is below the minimum {}",
                self.height, min_size.0
            )));
        }
        if self.width < min_size.1 {
            return Err(SatError::InvalidRegion(format!(
                "width {} is below the minimum {}",
                self.width, min_size.1
            )));
        }
        if !self.fits(rows, cols) {
            let (bottom, right) = self.bottom_right();
            return Err(SatError::InvalidRegion(format!(
                "box ends at ({bottom}, {right}), outside a {rows}x{cols} table"
            )));
        }
        Ok(())
    }

    /// Moves the anchor by `offset`, keeping the extent.
    pub fn translate(&self, offset: Offset) -> SatResult<Self> {
        let top = shift(self.top, offset.0, "top")?;
        let left = shift(self.left, offset.1, "left")?;
        Self::new(top, left, self.height, self.width)
    }

    /// Grows or shrinks the extent by `delta`, keeping the anchor.
    pub fn resize(&self, delta: Offset) -> SatResult<Self> {
        let height = shift(self.height, delta.0, "height")?;
        let width = shift(self.width, delta.1, "width")?;
        Self::new(self.top, self.left, height, width)
    }
}

fn shift(value: usize, by: isize, what: &str) -> SatResult<usize> {
    value
        .checked_add_signed(by)
        .ok_or_else(|| {
            SatError::InvalidRegion(format!("{what} {value} moved by {by} leaves the grid"))
        })
}

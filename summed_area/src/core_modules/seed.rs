// THEORY:
// A `SeedRequest` is an image-agnostic description of where a search should
// start: one of nine template positions plus a size. Resolving it against a
// concrete `rows x cols` table turns it into a `Region`.
//
// Positions are the four corners, the centre, and the centre of each edge. A
// size is either explicit `(height, width)` or a fraction `f` of the image
// area, in which case each side is `sqrt(f)` of the matching image side,
// truncated. Centred placements use truncating halves of both the image and
// the box, so the box sits at or just above/left of the true centre.
//
// Each position also names the direction preset that keeps the box pinned to
// the edge or corner it started on (top-left seed with the top-left-anchored
// moves, centre seed unconstrained, and so on).

use crate::core_modules::direction::DirectionSet;
use crate::core_modules::region::Region;
use crate::error::{SatError, SatResult};
use std::fmt;
use std::str::FromStr;

/// Fraction of the image area each template seed covers by default.
pub const DEFAULT_SEED_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Centre,
    CentreLeft,
    CentreRight,
    CentreTop,
    CentreBottom,
}

impl SeedPosition {
    pub const ALL: [SeedPosition; 9] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Centre,
        Self::CentreLeft,
        Self::CentreRight,
        Self::CentreTop,
        Self::CentreBottom,
    ];

    /// Short name, as accepted by `FromStr`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
            Self::Centre => "c",
            Self::CentreLeft => "cl",
            Self::CentreRight => "cr",
            Self::CentreTop => "ct",
            Self::CentreBottom => "cb",
        }
    }

    /// The preset that keeps a box seeded here attached to its edge or corner.
    pub fn anchored_directions(&self) -> DirectionSet {
        match self {
            Self::TopLeft => DirectionSet::TopLeftAnchored,
            Self::TopRight => DirectionSet::TopRightAnchored,
            Self::BottomLeft => DirectionSet::BottomLeftAnchored,
            Self::BottomRight => DirectionSet::BottomRightAnchored,
            Self::Centre => DirectionSet::Unconstrained,
            Self::CentreLeft => DirectionSet::LeftAnchored,
            Self::CentreRight => DirectionSet::RightAnchored,
            Self::CentreTop => DirectionSet::TopAnchored,
            Self::CentreBottom => DirectionSet::BottomAnchored,
        }
    }

    /// Top-left cell of a `height x width` box placed here in a `rows x cols`
    /// table. The box must already fit.
    fn anchor(&self, rows: usize, cols: usize, height: usize, width: usize) -> (usize, usize) {
        let first = 0;
        let middle_i = rows / 2 - height / 2;
        let middle_j = cols / 2 - width / 2;
        let last_i = rows - height;
        let last_j = cols - width;
        match self {
            Self::TopLeft => (first, first),
            Self::TopRight => (first, last_j),
            Self::BottomLeft => (last_i, first),
            Self::BottomRight => (last_i, last_j),
            Self::Centre => (middle_i, middle_j),
            Self::CentreLeft => (middle_i, first),
            Self::CentreRight => (middle_i, last_j),
            Self::CentreTop => (first, middle_j),
            Self::CentreBottom => (last_i, middle_j),
        }
    }
}

impl fmt::Display for SeedPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SeedPosition {
    type Err = SatError;

    fn from_str(raw: &str) -> SatResult<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|position| position.code() == normalized)
            .ok_or_else(|| SatError::InvalidConfig(format!("unknown seed position `{raw}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedExtent {
    /// Share of the image area, strictly between 0 and 1.
    Fraction(f64),
    /// Explicit `(height, width)`.
    Dims(usize, usize),
}

impl SeedExtent {
    fn resolve(&self, rows: usize, cols: usize) -> SatResult<(usize, usize)> {
        match *self {
            Self::Fraction(fraction) => {
                validate_fraction(fraction)?;
                let side = fraction.sqrt();
                Ok(((side * rows as f64) as usize, (side * cols as f64) as usize))
            }
            Self::Dims(height, width) => Ok((height, width)),
        }
    }
}

pub(crate) fn validate_fraction(fraction: f64) -> SatResult<()> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(SatError::InvalidConfig(format!(
            "seed fraction must lie strictly between 0 and 1, got {fraction}"
        )))
    }
}

/// A template position and size, not yet tied to an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedRequest {
    pub position: SeedPosition,
    pub extent: SeedExtent,
}

impl SeedRequest {
    pub fn new(position: SeedPosition, extent: SeedExtent) -> Self {
        Self { position, extent }
    }

    /// All nine positions, each covering `fraction` of the image.
    pub fn templates(fraction: f64) -> Vec<Self> {
        SeedPosition::ALL
            .into_iter()
            .map(|position| Self::new(position, SeedExtent::Fraction(fraction)))
            .collect()
    }

    /// The starting box this request describes inside a `rows x cols` table.
    pub fn region(&self, rows: usize, cols: usize) -> SatResult<Region> {
        let (height, width) = self.extent.resolve(rows, cols)?;
        if height == 0 || width == 0 || height > rows || width > cols {
            return Err(SatError::InvalidRegion(format!(
                "{} seed of {height}x{width} does not fit a {rows}x{cols} table",
                self.position
            )));
        }
        let (top, left) = self.position.anchor(rows, cols, height, width);
        Region::new(top, left, height, width)
    }
}

/// Parses `POS`, `POS:FRACTION` or `POS:HxW`, e.g. `tl`, `c:0.3`, `br:40x60`.
/// A bare position covers `DEFAULT_SEED_FRACTION` of the image.
impl FromStr for SeedRequest {
    type Err = SatError;

    fn from_str(raw: &str) -> SatResult<Self> {
        let (position, extent) = match raw.split_once(':') {
            Some((position, extent)) => (position, Some(extent.trim())),
            None => (raw, None),
        };
        let position = position.parse::<SeedPosition>()?;
        let extent = match extent {
            None => SeedExtent::Fraction(DEFAULT_SEED_FRACTION),
            Some(extent) if extent.contains(['x', 'X']) => {
                let (height, width) = crate::env_config::parse_size(extent)?;
                SeedExtent::Dims(height, width)
            }
            Some(extent) => {
                let fraction = extent
                    .parse::<f64>()
                    .map_err(|err| SatError::InvalidConfig(format!("seed size `{extent}`: {err}")))?;
                validate_fraction(fraction)?;
                SeedExtent::Fraction(fraction)
            }
        };
        Ok(Self::new(position, extent))
    }
}

// THEORY:
// A `Direction` is one move the box search may try: a translation of the anchor
// followed by a change of extent, both in (i, j) order and both scaled by the
// search's step size. A `DirectionSet` is a named list of such moves.
//
// The anchored presets keep one edge or corner of the box fixed in place. Moving
// a right or bottom edge while keeping the left or top edge still is a pure
// resize; keeping the right or bottom edge still while growing means the anchor
// has to move the opposite way by the same amount, which is why those presets
// pair a translation with an equal and opposite resize.

use crate::core_modules::region::Offset;
use crate::error::{SatError, SatResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction {
    pub translate: Offset,
    pub resize: Offset,
}

impl Direction {
    pub const fn new(translate: Offset, resize: Offset) -> Self {
        Self { translate, resize }
    }

    /// The move scaled by `step`. Fails when `step` or a scaled component does
    /// not fit in an `isize`.
    pub fn scaled(&self, step: usize) -> SatResult<Self> {
        let step = step_as_offset(step)?;
        let scale = |value: isize| {
            value
                .checked_mul(step)
                .ok_or_else(|| SatError::InvalidConfig(format!("move {value} scaled by {step} overflows")))
        };
        Ok(Self {
            translate: (scale(self.translate.0)?, scale(self.translate.1)?),
            resize: (scale(self.resize.0)?, scale(self.resize.1)?),
        })
    }
}

/// A step size as a signed offset. Steps above `isize::MAX` are rejected.
pub fn step_as_offset(step: usize) -> SatResult<isize> {
    isize::try_from(step)
        .map_err(|_| SatError::InvalidConfig(format!("step size {step} is larger than {}", isize::MAX)))
}

const fn d(translate: Offset, resize: Offset) -> Direction {
    Direction::new(translate, resize)
}

const UNCONSTRAINED: [Direction; 8] = [
    d((1, 0), (0, 0)),
    d((0, 1), (0, 0)),
    d((-1, 0), (0, 0)),
    d((0, -1), (0, 0)),
    d((0, 0), (1, 0)),
    d((0, 0), (0, 1)),
    d((0, 0), (-1, 0)),
    d((0, 0), (0, -1)),
];

const LEFT_ANCHORED: [Direction; 6] = [
    d((1, 0), (0, 0)),
    d((-1, 0), (0, 0)),
    d((0, 0), (1, 0)),
    d((0, 0), (0, 1)),
    d((0, 0), (-1, 0)),
    d((0, 0), (0, -1)),
];

const RIGHT_ANCHORED: [Direction; 6] = [
    d((1, 0), (0, 0)),
    d((-1, 0), (0, 0)),
    d((0, 0), (1, 0)),
    d((0, -1), (0, 1)),
    d((0, 0), (-1, 0)),
    d((0, 1), (0, -1)),
];

const TOP_ANCHORED: [Direction; 6] = [
    d((0, 1), (0, 0)),
    d((0, -1), (0, 0)),
    d((0, 0), (1, 0)),
    d((0, 0), (0, 1)),
    d((0, 0), (-1, 0)),
    d((0, 0), (0, -1)),
];

const BOTTOM_ANCHORED: [Direction; 6] = [
    d((0, 1), (0, 0)),
    d((0, -1), (0, 0)),
    d((-1, 0), (1, 0)),
    d((0, 0), (0, 1)),
    d((1, 0), (-1, 0)),
    d((0, 0), (0, -1)),
];

const TOP_LEFT_ANCHORED: [Direction; 4] = [
    d((0, 0), (1, 0)),
    d((0, 0), (0, 1)),
    d((0, 0), (-1, 0)),
    d((0, 0), (0, -1)),
];

const TOP_RIGHT_ANCHORED: [Direction; 4] = [
    d((0, 0), (1, 0)),
    d((0, -1), (0, 1)),
    d((0, 0), (-1, 0)),
    d((0, 1), (0, -1)),
];

const BOTTOM_LEFT_ANCHORED: [Direction; 4] = [
    d((-1, 0), (1, 0)),
    d((0, 0), (0, 1)),
    d((1, 0), (-1, 0)),
    d((0, 0), (0, -1)),
];

const BOTTOM_RIGHT_ANCHORED: [Direction; 4] = [
    d((-1, 0), (1, 0)),
    d((0, -1), (0, 1)),
    d((1, 0), (-1, 0)),
    d((0, 1), (0, -1)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DirectionSet {
    /// Free translation and resize in both axes.
    #[default]
    Unconstrained,
    LeftAnchored,
    RightAnchored,
    TopAnchored,
    BottomAnchored,
    TopLeftAnchored,
    TopRightAnchored,
    BottomLeftAnchored,
    BottomRightAnchored,
}

impl DirectionSet {
    pub const ALL: [DirectionSet; 9] = [
        Self::Unconstrained,
        Self::LeftAnchored,
        Self::RightAnchored,
        Self::TopAnchored,
        Self::BottomAnchored,
        Self::TopLeftAnchored,
        Self::TopRightAnchored,
        Self::BottomLeftAnchored,
        Self::BottomRightAnchored,
    ];

    pub fn directions(&self) -> &'static [Direction] {
        match self {
            Self::Unconstrained => &UNCONSTRAINED,
            Self::LeftAnchored => &LEFT_ANCHORED,
            Self::RightAnchored => &RIGHT_ANCHORED,
            Self::TopAnchored => &TOP_ANCHORED,
            Self::BottomAnchored => &BOTTOM_ANCHORED,
            Self::TopLeftAnchored => &TOP_LEFT_ANCHORED,
            Self::TopRightAnchored => &TOP_RIGHT_ANCHORED,
            Self::BottomLeftAnchored => &BOTTOM_LEFT_ANCHORED,
            Self::BottomRightAnchored => &BOTTOM_RIGHT_ANCHORED,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unconstrained => "unconstrained",
            Self::LeftAnchored => "left-anchored",
            Self::RightAnchored => "right-anchored",
            Self::TopAnchored => "top-anchored",
            Self::BottomAnchored => "bottom-anchored",
            Self::TopLeftAnchored => "top-left-anchored",
            Self::TopRightAnchored => "top-right-anchored",
            Self::BottomLeftAnchored => "bottom-left-anchored",
            Self::BottomRightAnchored => "bottom-right-anchored",
        }
    }
}

impl fmt::Display for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DirectionSet {
    type Err = SatError;

    fn from_str(raw: &str) -> SatResult<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|set| set.name() == normalized)
            .ok_or_else(|| SatError::InvalidConfig(format!("unknown direction set `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_moves_every_edge_both_ways() {
        let moves = DirectionSet::Unconstrained.directions();
        assert_eq!(moves.len(), 8);
        assert!(moves.contains(&Direction::new((0, -1), (0, 0))));
        assert!(moves.contains(&Direction::new((0, 0), (-1, 0))));
    }

    #[test]
    fn top_left_anchored_never_translates() {
        assert!(DirectionSet::TopLeftAnchored
            .directions()
            .iter()
            .all(|m| m.translate == (0, 0)));
    }

    #[test]
    fn anchored_edges_stay_put() {
        // For each preset, the fixed edge coordinate is unchanged by every move.
        for m in DirectionSet::RightAnchored.directions() {
            assert_eq!(m.translate.1 + m.resize.1, 0, "{m:?} moves the right edge");
        }
        for m in DirectionSet::BottomAnchored.directions() {
            assert_eq!(m.translate.0 + m.resize.0, 0, "{m:?} moves the bottom edge");
        }
        for m in DirectionSet::BottomRightAnchored.directions() {
            assert_eq!(m.translate.0 + m.resize.0, 0);
            assert_eq!(m.translate.1 + m.resize.1, 0);
        }
    }

    #[test]
    fn scaling_multiplies_both_vectors() {
        let m = Direction::new((-1, 0), (1, 0)).scaled(10).unwrap();
        assert_eq!(m, Direction::new((-10, 0), (10, 0)));
    }

    #[test]
    fn oversized_steps_are_rejected_not_wrapped() {
        let down = Direction::new((1, 0), (0, 0));
        assert!(matches!(down.scaled(usize::MAX), Err(SatError::InvalidConfig(_))));
        assert!(matches!(down.scaled(1 << 63), Err(SatError::InvalidConfig(_))));

        let largest = isize::MAX as usize;
        assert_eq!(down.scaled(largest).unwrap().translate, (isize::MAX, 0));
        let up = Direction::new((-1, 0), (0, 0));
        assert_eq!(up.scaled(largest).unwrap().translate, (-isize::MAX, 0));
        assert!(Direction::new((0, 0), (2, 0)).scaled(largest).is_err());
    }

    #[test]
    fn presets_have_their_exact_move_lists() {
        let expected: [(DirectionSet, &[(Offset, Offset)]); 9] = [
            (
                DirectionSet::Unconstrained,
                &[
                    ((1, 0), (0, 0)),
                    ((0, 1), (0, 0)),
                    ((-1, 0), (0, 0)),
                    ((0, -1), (0, 0)),
                    ((0, 0), (1, 0)),
                    ((0, 0), (0, 1)),
                    ((0, 0), (-1, 0)),
                    ((0, 0), (0, -1)),
                ],
            ),
            (
                DirectionSet::LeftAnchored,
                &[
                    ((1, 0), (0, 0)),
                    ((-1, 0), (0, 0)),
                    ((0, 0), (1, 0)),
                    ((0, 0), (0, 1)),
                    ((0, 0), (-1, 0)),
                    ((0, 0), (0, -1)),
                ],
            ),
            (
                DirectionSet::RightAnchored,
                &[
                    ((1, 0), (0, 0)),
                    ((-1, 0), (0, 0)),
                    ((0, 0), (1, 0)),
                    ((0, -1), (0, 1)),
                    ((0, 0), (-1, 0)),
                    ((0, 1), (0, -1)),
                ],
            ),
            (
                DirectionSet::TopAnchored,
                &[
                    ((0, 1), (0, 0)),
                    ((0, -1), (0, 0)),
                    ((0, 0), (1, 0)),
                    ((0, 0), (0, 1)),
                    ((0, 0), (-1, 0)),
                    ((0, 0), (0, -1)),
                ],
            ),
            (
                DirectionSet::BottomAnchored,
                &[
                    ((0, 1), (0, 0)),
                    ((0, -1), (0, 0)),
                    ((-1, 0), (1, 0)),
                    ((0, 0), (0, 1)),
                    ((1, 0), (-1, 0)),
                    ((0, 0), (0, -1)),
                ],
            ),
            (
                DirectionSet::TopLeftAnchored,
                &[
                    ((0, 0), (1, 0)),
                    ((0, 0), (0, 1)),
                    ((0, 0), (-1, 0)),
                    ((0, 0), (0, -1)),
                ],
            ),
            (
                DirectionSet::TopRightAnchored,
                &[
                    ((0, 0), (1, 0)),
                    ((0, -1), (0, 1)),
                    ((0, 0), (-1, 0)),
                    ((0, 1), (0, -1)),
                ],
            ),
            (
                DirectionSet::BottomLeftAnchored,
                &[
                    ((-1, 0), (1, 0)),
                    ((0, 0), (0, 1)),
                    ((1, 0), (-1, 0)),
                    ((0, 0), (0, -1)),
                ],
            ),
            (
                DirectionSet::BottomRightAnchored,
                &[
                    ((-1, 0), (1, 0)),
                    ((0, -1), (0, 1)),
                    ((1, 0), (-1, 0)),
                    ((0, 1), (0, -1)),
                ],
            ),
        ];

        for (set, moves) in expected {
            let moves: Vec<Direction> = moves
                .iter()
                .map(|&(translate, resize)| Direction::new(translate, resize))
                .collect();
            assert_eq!(set.directions(), moves.as_slice(), "{set}");
        }
    }

    #[test]
    fn parses_names() {
        for set in DirectionSet::ALL {
            assert_eq!(set.name().parse::<DirectionSet>().unwrap(), set);
        }
        assert_eq!(
            "Top_Left_Anchored".parse::<DirectionSet>().unwrap(),
            DirectionSet::TopLeftAnchored
        );
        assert!(matches!("diagonal".parse::<DirectionSet>(), Err(SatError::InvalidConfig(_))));
    }
}

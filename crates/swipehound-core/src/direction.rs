//! Swipe directions.
//!
//! A [`Direction`] is either one of the four cardinal [`PrimitiveDirection`]s
//! or a compound search policy that expands into an ordered pair of
//! primitives: sweep the primary direction first and, only if that pass comes
//! up empty, sweep the opposite one. Compound values are only meaningful to
//! the retry loop; everything below it works with primitives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four cardinal swipe directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PrimitiveDirection {
    pub const ALL: [PrimitiveDirection; 4] = [
        PrimitiveDirection::Up,
        PrimitiveDirection::Down,
        PrimitiveDirection::Left,
        PrimitiveDirection::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            PrimitiveDirection::Up => PrimitiveDirection::Down,
            PrimitiveDirection::Down => PrimitiveDirection::Up,
            PrimitiveDirection::Left => PrimitiveDirection::Right,
            PrimitiveDirection::Right => PrimitiveDirection::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, PrimitiveDirection::Up | PrimitiveDirection::Down)
    }

    pub fn name(self) -> &'static str {
        Direction::from(self).name()
    }
}

impl fmt::Display for PrimitiveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A swipe direction as requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Up first, then down.
    Vertical,
    /// Left first, then right.
    Horizontal,
    /// Down first, then up.
    VerticalDownFirst,
    /// Right first, then left.
    HorizontalRightFirst,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::Vertical,
        Direction::Horizontal,
        Direction::VerticalDownFirst,
        Direction::HorizontalRightFirst,
    ];

    /// Returns the primitive this direction names, or `None` for compound
    /// policies.
    pub fn as_primitive(self) -> Option<PrimitiveDirection> {
        match self {
            Direction::Up => Some(PrimitiveDirection::Up),
            Direction::Down => Some(PrimitiveDirection::Down),
            Direction::Left => Some(PrimitiveDirection::Left),
            Direction::Right => Some(PrimitiveDirection::Right),
            _ => None,
        }
    }

    pub fn is_compound(self) -> bool {
        self.as_primitive().is_none()
    }

    /// Decomposes the direction into the search phases it implies.
    ///
    /// The first element is always swept. The second, present only for
    /// compound policies, is swept with a fresh budget after the first pass
    /// is exhausted.
    pub fn phases(self) -> (PrimitiveDirection, Option<PrimitiveDirection>) {
        use PrimitiveDirection as P;
        match self {
            Direction::Up => (P::Up, None),
            Direction::Down => (P::Down, None),
            Direction::Left => (P::Left, None),
            Direction::Right => (P::Right, None),
            Direction::Vertical => (P::Up, Some(P::Down)),
            Direction::Horizontal => (P::Left, Some(P::Right)),
            Direction::VerticalDownFirst => (P::Down, Some(P::Up)),
            Direction::HorizontalRightFirst => (P::Right, Some(P::Left)),
        }
    }

    /// Every primitive the direction may end up swiping, in order.
    pub fn primitives(self) -> impl Iterator<Item = PrimitiveDirection> {
        let (primary, opposite) = self.phases();
        std::iter::once(primary).chain(opposite)
    }

    /// Returns a short, static name suitable for log fields.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Vertical => "vertical",
            Direction::Horizontal => "horizontal",
            Direction::VerticalDownFirst => "vertical_down_first",
            Direction::HorizontalRightFirst => "horizontal_right_first",
        }
    }
}

impl From<PrimitiveDirection> for Direction {
    fn from(direction: PrimitiveDirection) -> Self {
        match direction {
            PrimitiveDirection::Up => Direction::Up,
            PrimitiveDirection::Down => Direction::Down,
            PrimitiveDirection::Left => Direction::Left,
            PrimitiveDirection::Right => Direction::Right,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown direction name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid swipe direction '{0}'. Use: up, down, left, right, vertical, horizontal, vertical_down_first, horizontal_right_first")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Direction::ALL
            .into_iter()
            .find(|d| d.name() == normalized)
            .ok_or_else(|| ParseDirectionError(s.to_string()))
    }
}

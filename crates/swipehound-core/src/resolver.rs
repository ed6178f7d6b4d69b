//! Direction-to-coordinate resolution.
//!
//! Turns a [`Direction`] plus the current bounds of the swipe area into a
//! concrete [`GestureSpec`], using fixed fractions of the bounding rectangle.
//!
//! | area | direction | start | end |
//! |---|---|---|---|
//! | screen | up | center | (center x, 95% height) |
//! | screen | down | center | (center x, 5% height) |
//! | screen | left | center | (5% width, center y) |
//! | screen | right | center | (95% width, center y) |
//! | container | left | (90%, 50%) | (10%, 50%) |
//! | container | right | (20%, 50%) | (90%, 50%) |
//!
//! Container swipes have no vertical table, and compound directions never
//! resolve at this level; both are reported as
//! [`EngineError::UnsupportedDirection`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::direction::{Direction, PrimitiveDirection};
use crate::element::{Point, Rect};
use crate::error::EngineError;
use crate::gesture::GestureSpec;

/// Where a swipe happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeArea {
    Screen,
    Container,
}

impl SwipeArea {
    /// Whether this area has a coordinate table for `direction`.
    pub fn supports(self, direction: PrimitiveDirection) -> bool {
        match self {
            SwipeArea::Screen => true,
            SwipeArea::Container => !direction.is_vertical(),
        }
    }

    /// Checks every phase of `direction` against this area.
    ///
    /// Used by the retry loop to decline a request before touching the
    /// session.
    pub fn check(self, direction: Direction) -> Result<(), EngineError> {
        match direction.primitives().find(|p| !self.supports(*p)) {
            None => Ok(()),
            Some(_) => Err(EngineError::UnsupportedDirection { direction, area: self }),
        }
    }
}

impl fmt::Display for SwipeArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwipeArea::Screen => f.write_str("full-screen"),
            SwipeArea::Container => f.write_str("container"),
        }
    }
}

/// The swipe area together with its freshly queried rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeBounds {
    Screen(Rect),
    Container(Rect),
}

impl SwipeBounds {
    pub fn area(&self) -> SwipeArea {
        match self {
            SwipeBounds::Screen(_) => SwipeArea::Screen,
            SwipeBounds::Container(_) => SwipeArea::Container,
        }
    }

    pub fn rect(&self) -> Rect {
        match self {
            SwipeBounds::Screen(rect) | SwipeBounds::Container(rect) => *rect,
        }
    }
}

/// Fractions of the container rectangle: (start x, end x, start y, end y).
fn container_fractions(direction: PrimitiveDirection) -> Option<(f64, f64, f64, f64)> {
    match direction {
        PrimitiveDirection::Left => Some((0.9, 0.1, 0.5, 0.5)),
        PrimitiveDirection::Right => Some((0.2, 0.9, 0.5, 0.5)),
        PrimitiveDirection::Up | PrimitiveDirection::Down => None,
    }
}

fn screen_endpoints(direction: PrimitiveDirection, rect: Rect) -> (Point, Point) {
    let start = rect.center();
    let end = match direction {
        PrimitiveDirection::Up => Point::new(start.x, rect.fraction(0.0, 0.95).y),
        PrimitiveDirection::Down => Point::new(start.x, rect.fraction(0.0, 0.05).y),
        PrimitiveDirection::Left => Point::new(rect.fraction(0.05, 0.0).x, start.y),
        PrimitiveDirection::Right => Point::new(rect.fraction(0.95, 0.0).x, start.y),
    };
    (start, end)
}

/// Resolves `direction` against `bounds` into a gesture held for `duration`.
///
/// # Errors
///
/// [`EngineError::UnsupportedDirection`] for compound directions and for
/// vertical directions inside a container.
pub fn resolve(direction: Direction, bounds: SwipeBounds, duration: Duration) -> Result<GestureSpec, EngineError> {
    let unsupported = || EngineError::UnsupportedDirection {
        direction,
        area: bounds.area(),
    };
    let primitive = direction.as_primitive().ok_or_else(unsupported)?;

    let (start, end) = match bounds {
        SwipeBounds::Screen(rect) => screen_endpoints(primitive, rect),
        SwipeBounds::Container(rect) => {
            let (x1, x2, y1, y2) = container_fractions(primitive).ok_or_else(unsupported)?;
            (rect.fraction(x1, y1), rect.fraction(x2, y2))
        }
    };
    Ok(GestureSpec::new(start, end, duration))
}

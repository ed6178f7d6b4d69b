//! Single-gesture execution.
//!
//! A [`GestureSpec`] is a fully resolved, device-pixel drag instruction. The
//! [`GestureExecutor`] sends exactly one of them to the driver per call and
//! performs no retries of its own; retry policy lives in
//! [`search`](crate::search).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::{bounded, DriverError, MobileDriver};
use crate::element::Point;

/// Hold time for generic coordinate swipes.
pub const DEFAULT_SWIPE_DURATION: Duration = Duration::from_millis(1000);

/// Hold time for full-screen and container swipes.
///
/// Two seconds moves roughly half a screen: slow enough not to fling past the
/// target, fast enough to keep suites moving.
pub const STABLE_SWIPE_DURATION: Duration = Duration::from_millis(2000);

/// Hold time for swipes issued while searching for an element.
pub const SEEK_SWIPE_DURATION: Duration = Duration::from_millis(500);

/// A resolved press → hold → move → release instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureSpec {
    start: Point,
    end: Point,
    duration_ms: u64,
}

impl GestureSpec {
    pub fn new(start: Point, end: Point, duration: Duration) -> Self {
        Self {
            start,
            end,
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// How long the finger is held at the start point before moving.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// True when start and end coincide (a tap or long press).
    pub fn is_stationary(&self) -> bool {
        self.start == self.end
    }
}

/// Sends individual gestures to a driver.
#[derive(Clone)]
pub struct GestureExecutor {
    driver: Arc<dyn MobileDriver>,
    call_timeout: Duration,
}

impl GestureExecutor {
    /// Creates an executor whose calls are bounded by `call_timeout` plus the
    /// gesture's own hold time.
    pub fn new(driver: Arc<dyn MobileDriver>, call_timeout: Duration) -> Self {
        Self { driver, call_timeout }
    }

    /// Performs one gesture.
    ///
    /// Transport failures are returned as-is; an unanswered call becomes
    /// [`DriverError::Timeout`].
    pub async fn perform(&self, gesture: &GestureSpec) -> Result<(), DriverError> {
        debug!(
            start_x = gesture.start.x,
            start_y = gesture.start.y,
            end_x = gesture.end.x,
            end_y = gesture.end.y,
            duration_ms = gesture.duration_ms,
            stationary = gesture.is_stationary(),
            "performing gesture"
        );
        bounded(
            self.call_timeout + gesture.duration(),
            self.driver.perform_gesture(gesture),
        )
        .await
    }

    /// Swipes between two points.
    pub async fn swipe(&self, start: Point, end: Point, duration: Duration) -> Result<(), DriverError> {
        self.perform(&GestureSpec::new(start, end, duration)).await
    }

    pub async fn tap(&self, point: Point) -> Result<(), DriverError> {
        debug!(x = point.x, y = point.y, "tap");
        bounded(self.call_timeout, self.driver.tap(point)).await
    }

    pub async fn long_press(&self, point: Point, duration: Duration) -> Result<(), DriverError> {
        debug!(x = point.x, y = point.y, duration_ms = duration.as_millis() as u64, "long press");
        bounded(self.call_timeout + duration, self.driver.long_press(point, duration)).await
    }
}

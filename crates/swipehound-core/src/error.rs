//! Engine-level errors.

use thiserror::Error;

use crate::direction::Direction;
use crate::driver::DriverError;
use crate::element::Locator;
use crate::resolver::SwipeArea;

/// Errors returned by engine operations.
///
/// "Not found" and "still present" are never errors; they are ordinary
/// outcomes reported through `bool`s and outcome enums. An `EngineError`
/// means the request itself could not be carried out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The direction has no coordinate table for the requested swipe area.
    ///
    /// Raised before any remote call and never retried.
    #[error("Incorrect swipe direction '{direction}' for {area} swipe")]
    UnsupportedDirection { direction: Direction, area: SwipeArea },

    /// A single remote call failed outside of a retry loop.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A locator that must resolve to an element matched nothing.
    #[error("Element not found: {0}")]
    ElementNotFound(Locator),
}

impl EngineError {
    /// True for errors caused by the request shape rather than the session.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, EngineError::UnsupportedDirection { .. })
    }
}

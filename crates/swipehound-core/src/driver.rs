//! Driver capability trait for backend-agnostic mobile automation.
//!
//! This module defines the [`MobileDriver`] trait, the only thing the engine
//! knows about the remote automation session (an Appium/WebDriver client, a
//! device agent, or an in-memory fake in tests). The engine borrows a driver
//! through an `Arc<dyn MobileDriver>`; it never opens, owns, or closes the
//! session behind it.
//!
//! # Ambient state
//!
//! [`implicit_wait`](MobileDriver::implicit_wait) and
//! [`set_implicit_wait`](MobileDriver::set_implicit_wait) expose the session's
//! implicit wait, which applies to every element lookup on that session. The
//! engine only changes it through
//! [`ImplicitWaitGuard`](crate::implicit_wait::ImplicitWaitGuard).

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::element::{ElementHandle, Locator, Point, Size};
use crate::gesture::GestureSpec;

/// Errors that can occur during a single remote driver call.
///
/// Backends map their transport-specific failures onto this enum so the
/// engine can treat them uniformly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// A command reached the backend and failed with the given message.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The backend is not available or not connected.
    #[error("Not connected to automation backend")]
    NotConnected,

    /// The connection to the backend was lost.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// A remote call did not answer within its bound.
    #[error("Operation timed out")]
    Timeout,

    /// An element handle no longer refers to anything in the session.
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// The backend does not implement the requested command.
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

/// Trait for a remote mobile UI-automation session.
///
/// All methods that touch the device are async; each is one round-trip to the
/// session. The engine wraps every call in its own timeout, so implementors do
/// not need to bound them.
///
/// # Required Methods
///
/// Implementors must provide: [`window_size`](MobileDriver::window_size),
/// [`find_elements`](MobileDriver::find_elements),
/// [`element_location`](MobileDriver::element_location),
/// [`element_size`](MobileDriver::element_size),
/// [`perform_gesture`](MobileDriver::perform_gesture),
/// [`implicit_wait`](MobileDriver::implicit_wait),
/// [`set_implicit_wait`](MobileDriver::set_implicit_wait),
/// and [`click`](MobileDriver::click).
#[async_trait]
pub trait MobileDriver: Send + Sync {
    /// Size of the application window in device pixels.
    async fn window_size(&self) -> Result<Size, DriverError>;

    /// Find every element matching `locator`.
    ///
    /// An empty vector means "not present" and is not an error. The lookup is
    /// subject to the session's implicit wait.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError>;

    /// Top-left corner of the element in device pixels.
    async fn element_location(&self, element: &ElementHandle) -> Result<Point, DriverError>;

    /// Width and height of the element in device pixels.
    async fn element_size(&self, element: &ElementHandle) -> Result<Size, DriverError>;

    /// Whether the element is currently displayed.
    ///
    /// The default implementation treats an element with a non-empty size as
    /// displayed. Backends with a native visibility query should override it.
    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        let size = self.element_size(element).await?;
        Ok(size.width > 0 && size.height > 0)
    }

    /// Execute press → hold → move → release as one remote operation.
    async fn perform_gesture(&self, gesture: &GestureSpec) -> Result<(), DriverError>;

    /// The session's current implicit wait.
    async fn implicit_wait(&self) -> Result<Duration, DriverError>;

    /// Replace the session's implicit wait.
    async fn set_implicit_wait(&self, wait: Duration) -> Result<(), DriverError>;

    /// Click an element.
    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Tap at specific screen coordinates.
    ///
    /// The default implementation sends a zero-length, zero-hold gesture at
    /// `point`.
    async fn tap(&self, point: Point) -> Result<(), DriverError> {
        self.perform_gesture(&GestureSpec::new(point, point, Duration::ZERO))
            .await
    }

    /// Press and hold at `point` for `duration`.
    ///
    /// The default implementation sends a zero-length gesture with the given
    /// hold time.
    async fn long_press(&self, point: Point, duration: Duration) -> Result<(), DriverError> {
        self.perform_gesture(&GestureSpec::new(point, point, duration))
            .await
    }

    /// Dismiss the on-screen keyboard.
    ///
    /// Not all backends support this. The default implementation returns
    /// [`DriverError::Unsupported`].
    async fn hide_keyboard(&self) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("hide_keyboard"))
    }
}

/// Runs one remote call under `limit`, mapping expiry to [`DriverError::Timeout`].
///
/// The call is dropped when the limit passes; whether the remote side keeps
/// working on it is up to the backend.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout),
    }
}

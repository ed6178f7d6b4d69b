//! # swipehound-core
//!
//! Gesture-based element discovery for mobile UI automation.
//!
//! Many elements of a mobile app only exist on screen after the user scrolls
//! to them. This crate finds them the way a user would: swipe, look, repeat.
//! It works against any automation backend that implements
//! [`driver::MobileDriver`].
//!
//! ## Modules
//!
//! - [`driver`] - The driver capability trait and transport errors
//! - [`element`] - Locators, element handles and screen geometry
//! - [`direction`] - Primitive and compound swipe directions
//! - [`resolver`] - Direction-to-coordinate resolution over screen or container bounds
//! - [`gesture`] - Gesture specs and the executor that performs them
//! - [`implicit_wait`] - Scoped overrides of the session's implicit wait
//! - [`probe`] - Bounded presence checks that never fail
//! - [`search`] - The swipe-until-visible retry loop and its reports
//! - [`wait`] - Time-bounded condition polling (disappearance, motion settle)
//! - [`engine`] - The [`GestureEngine`](engine::GestureEngine) facade
//! - [`config`] - Persistent timeouts and budgets
//! - [`error`] - Engine-level errors
//! - [`logging`] - Subscriber setup
//!
//! ## Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use swipehound_core::driver::MobileDriver;
//! use swipehound_core::config::EngineConfig;
//! use swipehound_core::direction::Direction;
//! use swipehound_core::element::Locator;
//! use swipehound_core::engine::GestureEngine;
//!
//! # async fn demo(driver: Arc<dyn MobileDriver>) -> Result<(), swipehound_core::error::EngineError> {
//! swipehound_core::logging::init();
//! let engine = GestureEngine::new(driver, EngineConfig::load());
//!
//! // Swipe down through the list, then back up, until the row shows.
//! let row = Locator::xpath("//*[@text='Privacy']");
//! if engine.swipe_until_element_presence(row.clone()).await? {
//!     engine.tap_element(row).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod direction;
pub mod driver;
pub mod element;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod implicit_wait;
pub mod logging;
pub mod probe;
pub mod resolver;
pub mod search;
pub mod wait;
